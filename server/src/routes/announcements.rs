use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use chrono::Utc;
use entity::announcements;
use platform_api::{ApiError, ApiResult};
use products_hr::{access::Permission, required_text};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;

use super::domain_error;
use crate::{http::AppState, session::SessionUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route("/announcements/{id}", delete(delete_announcement))
}

async fn list_announcements(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<Vec<announcements::Model>>> {
    let records = announcements::Entity::find()
        .filter(announcements::Column::CompanyName.eq(user.company_name.as_str()))
        .order_by_desc(announcements::Column::Pinned)
        .order_by_desc(announcements::Column::CreatedAt)
        .all(&state.pool)
        .await?;
    Ok(Json(records))
}

#[derive(Deserialize)]
struct AnnouncementBody {
    title: String,
    body: String,
    #[serde(default)]
    pinned: bool,
}

async fn create_announcement(
    State(state): State<AppState>,
    user: SessionUser,
    Json(body): Json<AnnouncementBody>,
) -> ApiResult<(StatusCode, Json<announcements::Model>)> {
    user.require(Permission::Announcements)?;
    let title = required_text("title", &body.title, 256).map_err(domain_error)?;
    let text = required_text("body", &body.body, 10_000).map_err(domain_error)?;
    let record = announcements::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(user.company_name.clone()),
        title: Set(title),
        body: Set(text),
        author_email: Set(user.email.clone()),
        pinned: Set(body.pinned),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.pool)
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn delete_announcement(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require(Permission::Announcements)?;
    let result = announcements::Entity::delete_many()
        .filter(announcements::Column::Id.eq(id))
        .filter(announcements::Column::CompanyName.eq(user.company_name.as_str()))
        .exec(&state.pool)
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
