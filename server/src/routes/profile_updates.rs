use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use entity::{
    profile_update_requests::{self, ReviewStatus},
    users,
};
use platform_api::{ApiError, ApiResult};
use products_hr::profile::ProfileChanges;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{DecisionBody, domain_error, employees::employee_by_email};
use crate::{http::AppState, session::SessionUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile-updates", get(list_requests).post(submit_request))
        .route("/profile-updates/{id}/approve", post(approve_request))
        .route("/profile-updates/{id}/reject", post(reject_request))
}

async fn submit_request(
    State(state): State<AppState>,
    user: SessionUser,
    Json(changes): Json<ProfileChanges>,
) -> ApiResult<(StatusCode, Json<profile_update_requests::Model>)> {
    user.require_employee()?;
    let changes = changes.normalized().map_err(domain_error)?;
    let pending = profile_update_requests::Entity::find()
        .filter(profile_update_requests::Column::CompanyName.eq(user.company_name.as_str()))
        .filter(profile_update_requests::Column::EmpEmail.eq(user.email.as_str()))
        .filter(profile_update_requests::Column::Status.eq(ReviewStatus::Pending))
        .one(&state.pool)
        .await?;
    if pending.is_some() {
        return Err(ApiError::conflict(
            "a profile update is already awaiting review",
        ));
    }

    let changes = serde_json::to_value(&changes).map_err(|err| ApiError::internal(err.into()))?;
    let record = profile_update_requests::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(user.company_name.clone()),
        emp_email: Set(user.email.clone()),
        changes: Set(changes),
        status: Set(ReviewStatus::Pending),
        decided_by: Set(None),
        decided_at: Set(None),
        note: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.pool)
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_requests(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<Vec<profile_update_requests::Model>>> {
    let mut select = profile_update_requests::Entity::find()
        .filter(profile_update_requests::Column::CompanyName.eq(user.company_name.as_str()));
    if !user.is_employer() {
        select = select.filter(profile_update_requests::Column::EmpEmail.eq(user.email.as_str()));
    }
    let records = select
        .order_by_desc(profile_update_requests::Column::CreatedAt)
        .all(&state.pool)
        .await?;
    Ok(Json(records))
}

async fn pending_request<C: sea_orm::ConnectionTrait>(
    db: &C,
    user: &SessionUser,
    id: Uuid,
) -> ApiResult<profile_update_requests::Model> {
    user.require_employer()?;
    let record = profile_update_requests::Entity::find_by_id(id)
        .filter(profile_update_requests::Column::CompanyName.eq(user.company_name.as_str()))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)?;
    if record.status != ReviewStatus::Pending {
        return Err(ApiError::conflict("profile update is no longer pending"));
    }
    Ok(record)
}

#[instrument(name = "profile_updates.approve", skip_all, fields(company = %user.company_name))]
async fn approve_request(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    body: Option<Json<DecisionBody>>,
) -> ApiResult<Json<profile_update_requests::Model>> {
    let note = body.and_then(|Json(body)| body.note());
    let txn = state.pool.begin().await?;
    let record = pending_request(&txn, &user, id).await?;
    let changes: ProfileChanges = serde_json::from_value(record.changes.clone())
        .map_err(|err| ApiError::internal(err.into()))?;
    let employee = employee_by_email(&txn, &user.company_name, &record.emp_email).await?;

    let mut active = employee.into_active_model();
    if let Some(name) = changes.name.clone() {
        active.name = Set(name);
    }
    if let Some(phone) = changes.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(address) = changes.address {
        active.address = Set(Some(address));
    }
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;
    if let Some(name) = changes.name {
        users::Entity::update_many()
            .col_expr(users::Column::Name, Expr::value(name))
            .filter(users::Column::Email.eq(record.emp_email.as_str()))
            .exec(&txn)
            .await?;
    }

    let mut request = record.into_active_model();
    request.status = Set(ReviewStatus::Approved);
    request.decided_by = Set(Some(user.email.clone()));
    request.decided_at = Set(Some(Utc::now().into()));
    request.note = Set(note);
    let updated = request.update(&txn).await?;
    txn.commit().await?;
    info!(request = %updated.id, "profile update applied");
    Ok(Json(updated))
}

async fn reject_request(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    body: Option<Json<DecisionBody>>,
) -> ApiResult<Json<profile_update_requests::Model>> {
    let record = pending_request(&state.pool, &user, id).await?;
    let mut request = record.into_active_model();
    request.status = Set(ReviewStatus::Rejected);
    request.decided_by = Set(Some(user.email.clone()));
    request.decided_at = Set(Some(Utc::now().into()));
    request.note = Set(body.and_then(|Json(body)| body.note()));
    Ok(Json(request.update(&state.pool).await?))
}
