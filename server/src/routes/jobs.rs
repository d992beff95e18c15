use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use entity::{
    companies,
    job_postings::{self, JobStatus},
};
use platform_api::{ApiError, ApiResult};
use products_hr::{access::Permission, optional_text, required_text};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use super::domain_error;
use crate::{http::AppState, session::SessionUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/{id}", get(get_job).patch(update_job).delete(delete_job))
        .route("/public/companies/{company}/jobs", get(public_jobs))
}

async fn list_jobs(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<Vec<job_postings::Model>>> {
    let jobs = job_postings::Entity::find()
        .filter(job_postings::Column::CompanyName.eq(user.company_name.as_str()))
        .order_by_desc(job_postings::Column::CreatedAt)
        .all(&state.pool)
        .await?;
    Ok(Json(jobs))
}

async fn find_job(
    state: &AppState,
    user: &SessionUser,
    id: Uuid,
) -> ApiResult<job_postings::Model> {
    job_postings::Entity::find_by_id(id)
        .filter(job_postings::Column::CompanyName.eq(user.company_name.as_str()))
        .one(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)
}

async fn get_job(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<job_postings::Model>> {
    Ok(Json(find_job(&state, &user, id).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateJobBody {
    title: String,
    description: String,
    location: Option<String>,
    employment_type: Option<String>,
}

async fn create_job(
    State(state): State<AppState>,
    user: SessionUser,
    Json(body): Json<CreateJobBody>,
) -> ApiResult<(StatusCode, Json<job_postings::Model>)> {
    user.require(Permission::Recruitment)?;
    let title = required_text("title", &body.title, 256).map_err(domain_error)?;
    let description =
        required_text("description", &body.description, 20_000).map_err(domain_error)?;
    let now = Utc::now();
    let job = job_postings::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(user.company_name.clone()),
        title: Set(title),
        description: Set(description),
        location: Set(optional_text(body.location)),
        employment_type: Set(optional_text(body.employment_type)),
        status: Set(JobStatus::Open),
        created_by: Set(user.email.clone()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.pool)
    .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateJobBody {
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    employment_type: Option<String>,
    status: Option<JobStatus>,
}

async fn update_job(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateJobBody>,
) -> ApiResult<Json<job_postings::Model>> {
    user.require(Permission::Recruitment)?;
    let mut active = find_job(&state, &user, id).await?.into_active_model();
    if let Some(title) = body.title {
        active.title = Set(required_text("title", &title, 256).map_err(domain_error)?);
    }
    if let Some(description) = body.description {
        active.description =
            Set(required_text("description", &description, 20_000).map_err(domain_error)?);
    }
    if let Some(location) = body.location {
        active.location = Set(optional_text(Some(location)));
    }
    if let Some(employment_type) = body.employment_type {
        active.employment_type = Set(optional_text(Some(employment_type)));
    }
    if let Some(status) = body.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now().into());
    Ok(Json(active.update(&state.pool).await?))
}

async fn delete_job(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require(Permission::Recruitment)?;
    let result = job_postings::Entity::delete_many()
        .filter(job_postings::Column::Id.eq(id))
        .filter(job_postings::Column::CompanyName.eq(user.company_name.as_str()))
        .exec(&state.pool)
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Open postings for a careers page. No session required.
async fn public_jobs(
    State(state): State<AppState>,
    Path(company): Path<String>,
) -> ApiResult<Json<Vec<job_postings::Model>>> {
    let company = companies::Entity::find_by_id(company)
        .one(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    let jobs = job_postings::Entity::find()
        .filter(job_postings::Column::CompanyName.eq(company.name))
        .filter(job_postings::Column::Status.eq(JobStatus::Open))
        .order_by_desc(job_postings::Column::CreatedAt)
        .all(&state.pool)
        .await?;
    Ok(Json(jobs))
}
