use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use entity::payslip_requests::{self, PayslipStatus};
use platform_api::{ApiError, ApiResult};
use products_hr::payroll::{PayslipLine, Period};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{DecisionBody, domain_error, payroll::find_run};
use crate::{http::AppState, session::SessionUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payslips", get(list_requests).post(request_payslip))
        .route("/payslips/{id}/fulfil", post(fulfil_request))
        .route("/payslips/{id}/reject", post(reject_request))
}

#[derive(Deserialize)]
struct PayslipBody {
    period: String,
}

async fn request_payslip(
    State(state): State<AppState>,
    user: SessionUser,
    Json(body): Json<PayslipBody>,
) -> ApiResult<(StatusCode, Json<payslip_requests::Model>)> {
    user.require_employee()?;
    let period = Period::parse(&body.period).map_err(domain_error)?.to_string();
    let pending = payslip_requests::Entity::find()
        .filter(payslip_requests::Column::CompanyName.eq(user.company_name.as_str()))
        .filter(payslip_requests::Column::EmpEmail.eq(user.email.as_str()))
        .filter(payslip_requests::Column::Period.eq(period.as_str()))
        .filter(payslip_requests::Column::Status.eq(PayslipStatus::Pending))
        .one(&state.pool)
        .await?;
    if pending.is_some() {
        return Err(ApiError::conflict(format!(
            "a payslip request for {period} is already pending"
        )));
    }

    let record = payslip_requests::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(user.company_name.clone()),
        emp_email: Set(user.email.clone()),
        period: Set(period),
        status: Set(PayslipStatus::Pending),
        payslip: Set(None),
        note: Set(None),
        created_at: Set(Utc::now().into()),
        resolved_at: Set(None),
    }
    .insert(&state.pool)
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_requests(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<Vec<payslip_requests::Model>>> {
    let mut select = payslip_requests::Entity::find()
        .filter(payslip_requests::Column::CompanyName.eq(user.company_name.as_str()));
    if !user.is_employer() {
        select = select.filter(payslip_requests::Column::EmpEmail.eq(user.email.as_str()));
    }
    let records = select
        .order_by_desc(payslip_requests::Column::CreatedAt)
        .all(&state.pool)
        .await?;
    Ok(Json(records))
}

async fn pending_request(
    state: &AppState,
    user: &SessionUser,
    id: Uuid,
) -> ApiResult<payslip_requests::Model> {
    user.require_employer()?;
    let record = payslip_requests::Entity::find_by_id(id)
        .filter(payslip_requests::Column::CompanyName.eq(user.company_name.as_str()))
        .one(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    if record.status != PayslipStatus::Pending {
        return Err(ApiError::conflict("payslip request is no longer pending"));
    }
    Ok(record)
}

#[instrument(name = "payslips.fulfil", skip_all, fields(company = %user.company_name))]
async fn fulfil_request(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<payslip_requests::Model>> {
    let record = pending_request(&state, &user, id).await?;
    let period = Period::parse(&record.period).map_err(domain_error)?;
    let run = find_run(&state.pool, &user.company_name, period)
        .await?
        .ok_or_else(|| ApiError::conflict(format!("payroll for {period} has not been run")))?;
    let lines: Vec<PayslipLine> =
        serde_json::from_value(run.lines).map_err(|err| ApiError::internal(err.into()))?;
    let line = lines
        .into_iter()
        .find(|line| line.emp_email == record.emp_email)
        .ok_or_else(|| {
            ApiError::conflict(format!(
                "payroll for {period} does not include {}",
                record.emp_email
            ))
        })?;
    let snapshot = serde_json::to_value(&line).map_err(|err| ApiError::internal(err.into()))?;

    let mut active = record.into_active_model();
    active.status = Set(PayslipStatus::Fulfilled);
    active.payslip = Set(Some(snapshot));
    active.resolved_at = Set(Some(Utc::now().into()));
    let updated = active.update(&state.pool).await?;
    info!(request = %updated.id, %period, "payslip issued");
    Ok(Json(updated))
}

async fn reject_request(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    body: Option<Json<DecisionBody>>,
) -> ApiResult<Json<payslip_requests::Model>> {
    let record = pending_request(&state, &user, id).await?;
    let mut active = record.into_active_model();
    active.status = Set(PayslipStatus::Rejected);
    active.note = Set(body.and_then(|Json(body)| body.note()));
    active.resolved_at = Set(Some(Utc::now().into()));
    Ok(Json(active.update(&state.pool).await?))
}
