use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use entity::{
    employees,
    leave_requests::{self, LeaveKind, LeaveStatus},
};
use platform_api::{ApiError, ApiResult};
use products_hr::{access::Permission, leave, required_text};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{DecisionBody, domain_error, employees::employee_by_email};
use crate::{http::AppState, session::SessionUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leaves", get(list_leaves).post(request_leave))
        .route("/leaves/{id}/approve", post(approve_leave))
        .route("/leaves/{id}/reject", post(reject_leave))
        .route("/leaves/{id}/cancel", post(cancel_leave))
}

#[derive(Deserialize)]
struct ListQuery {
    status: Option<LeaveStatus>,
}

async fn list_leaves(
    State(state): State<AppState>,
    user: SessionUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<leave_requests::Model>>> {
    let mut select = leave_requests::Entity::find()
        .filter(leave_requests::Column::CompanyName.eq(user.company_name.as_str()));
    if !user.grants.allows(Permission::Leave) {
        select = select.filter(leave_requests::Column::EmpEmail.eq(user.email.as_str()));
    }
    if let Some(status) = query.status {
        select = select.filter(leave_requests::Column::Status.eq(status));
    }
    let records = select
        .order_by_desc(leave_requests::Column::CreatedAt)
        .all(&state.pool)
        .await?;
    Ok(Json(records))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaveBody {
    kind: LeaveKind,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
}

#[instrument(name = "leaves.request", skip_all, fields(company = %user.company_name))]
async fn request_leave(
    State(state): State<AppState>,
    user: SessionUser,
    Json(body): Json<LeaveBody>,
) -> ApiResult<(StatusCode, Json<leave_requests::Model>)> {
    user.require_employee()?;
    let reason = required_text("reason", &body.reason, 2_000).map_err(domain_error)?;
    let employee = employee_by_email(&state.pool, &user.company_name, &user.email).await?;
    let days = leave::validate_request(
        body.kind,
        body.start_date,
        body.end_date,
        employee.leave_balance,
    )
    .map_err(domain_error)?;

    let record = leave_requests::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(user.company_name.clone()),
        emp_email: Set(user.email.clone()),
        kind: Set(body.kind),
        start_date: Set(body.start_date),
        end_date: Set(body.end_date),
        days: Set(days),
        reason: Set(reason),
        status: Set(LeaveStatus::Pending),
        decided_by: Set(None),
        decided_at: Set(None),
        note: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.pool)
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn pending_request<C: ConnectionTrait>(
    db: &C,
    company_name: &str,
    id: Uuid,
) -> ApiResult<leave_requests::Model> {
    let record = leave_requests::Entity::find_by_id(id)
        .filter(leave_requests::Column::CompanyName.eq(company_name))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)?;
    if record.status != LeaveStatus::Pending {
        return Err(ApiError::conflict("leave request is no longer pending"));
    }
    Ok(record)
}

fn ensure_can_decide(user: &SessionUser, record: &leave_requests::Model) -> ApiResult<()> {
    user.require(Permission::Leave)?;
    if record.emp_email == user.email {
        return Err(ApiError::forbidden("cannot decide your own leave request"));
    }
    Ok(())
}

/// Moves a pending request to `status`. A conflict means another decision
/// landed first.
async fn settle<C: ConnectionTrait>(
    db: &C,
    record: &leave_requests::Model,
    status: LeaveStatus,
    decision: Option<(&str, Option<String>)>,
) -> ApiResult<leave_requests::Model> {
    let mut update = leave_requests::Entity::update_many()
        .col_expr(leave_requests::Column::Status, Expr::value(status.to_value()))
        .filter(leave_requests::Column::Id.eq(record.id))
        .filter(leave_requests::Column::Status.eq(LeaveStatus::Pending));
    if let Some((decided_by, note)) = decision {
        update = update
            .col_expr(leave_requests::Column::DecidedBy, Expr::value(decided_by))
            .col_expr(
                leave_requests::Column::DecidedAt,
                Expr::value(DateTimeWithTimeZone::from(Utc::now())),
            )
            .col_expr(leave_requests::Column::Note, Expr::value(note));
    }
    if update.exec(db).await?.rows_affected == 0 {
        return Err(ApiError::conflict("leave request is no longer pending"));
    }
    leave_requests::Entity::find_by_id(record.id)
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)
}

#[instrument(name = "leaves.approve", skip_all, fields(company = %user.company_name))]
async fn approve_leave(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    body: Option<Json<DecisionBody>>,
) -> ApiResult<Json<leave_requests::Model>> {
    let note = body.and_then(|Json(body)| body.note());
    let txn = state.pool.begin().await?;
    let record = pending_request(&txn, &user.company_name, id).await?;
    ensure_can_decide(&user, &record)?;
    let updated = settle(
        &txn,
        &record,
        LeaveStatus::Approved,
        Some((user.email.as_str(), note)),
    )
    .await?;

    if record.kind.is_paid() {
        let employee = employee_by_email(&txn, &user.company_name, &record.emp_email).await?;
        leave::ensure_balance(record.kind, record.days, employee.leave_balance)
            .map_err(domain_error)?;
        let deducted = employees::Entity::update_many()
            .col_expr(
                employees::Column::LeaveBalance,
                Expr::col(employees::Column::LeaveBalance).sub(record.days),
            )
            .col_expr(
                employees::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(employees::Column::Id.eq(employee.id))
            .filter(employees::Column::LeaveBalance.gte(record.days))
            .exec(&txn)
            .await?;
        if deducted.rows_affected == 0 {
            return Err(ApiError::invalid("insufficient leave balance"));
        }
    }
    txn.commit().await?;

    info!(leave = %updated.id, days = updated.days, "leave approved");
    Ok(Json(updated))
}

async fn reject_leave(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    body: Option<Json<DecisionBody>>,
) -> ApiResult<Json<leave_requests::Model>> {
    let note = body.and_then(|Json(body)| body.note());
    let record = pending_request(&state.pool, &user.company_name, id).await?;
    ensure_can_decide(&user, &record)?;
    let updated = settle(
        &state.pool,
        &record,
        LeaveStatus::Rejected,
        Some((user.email.as_str(), note)),
    )
    .await?;
    Ok(Json(updated))
}

async fn cancel_leave(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<leave_requests::Model>> {
    let record = pending_request(&state.pool, &user.company_name, id).await?;
    if record.emp_email != user.email {
        return Err(ApiError::forbidden("only the requester can cancel"));
    }
    Ok(Json(
        settle(&state.pool, &record, LeaveStatus::Cancelled, None).await?,
    ))
}
