//! Company and team chat channels. Clients poll with `after`.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use entity::chat_messages;
use platform_api::{ApiError, ApiResult};
use products_hr::required_text;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::Deserialize;
use uuid::Uuid;

use super::{domain_error, teams::find_team};
use crate::{http::AppState, session::SessionUser};

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 200;
const MAX_BODY_CHARS: usize = 2_000;

pub fn router() -> Router<AppState> {
    Router::new().route("/chat/{channel}", get(list_messages).post(post_message))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    General,
    Team(Uuid),
}

impl Channel {
    fn parse(raw: &str) -> ApiResult<Self> {
        if raw == "general" {
            return Ok(Self::General);
        }
        raw.strip_prefix("team:")
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(Self::Team)
            .ok_or_else(|| ApiError::invalid(format!("unknown channel {raw:?}")))
    }

    fn key(self) -> String {
        match self {
            Self::General => "general".to_string(),
            Self::Team(id) => format!("team:{id}"),
        }
    }
}

/// Resolves the channel and checks the user may read and write it.
async fn open_channel(state: &AppState, user: &SessionUser, raw: &str) -> ApiResult<Channel> {
    let channel = Channel::parse(raw)?;
    if let Channel::Team(id) = channel {
        let team = find_team(&state.pool, &user.company_name, id).await?;
        if !user.is_employer() && !team.has_member(&user.email) {
            return Err(ApiError::forbidden("not a member of this team"));
        }
    }
    Ok(channel)
}

#[derive(Deserialize)]
struct HistoryQuery {
    after: Option<DateTime<Utc>>,
    limit: Option<u64>,
}

async fn list_messages(
    State(state): State<AppState>,
    user: SessionUser,
    Path(channel): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<chat_messages::Model>>> {
    let channel = open_channel(&state, &user, &channel).await?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let select = chat_messages::Entity::find()
        .filter(chat_messages::Column::CompanyName.eq(user.company_name.as_str()))
        .filter(chat_messages::Column::Channel.eq(channel.key()));

    let messages = match query.after {
        Some(after) => {
            select
                .filter(chat_messages::Column::CreatedAt.gt(after))
                .order_by_asc(chat_messages::Column::CreatedAt)
                .limit(limit)
                .all(&state.pool)
                .await?
        }
        None => {
            let mut latest = select
                .order_by_desc(chat_messages::Column::CreatedAt)
                .limit(limit)
                .all(&state.pool)
                .await?;
            latest.reverse();
            latest
        }
    };
    Ok(Json(messages))
}

#[derive(Deserialize)]
struct MessageBody {
    body: String,
}

async fn post_message(
    State(state): State<AppState>,
    user: SessionUser,
    Path(channel): Path<String>,
    Json(body): Json<MessageBody>,
) -> ApiResult<(StatusCode, Json<chat_messages::Model>)> {
    let channel = open_channel(&state, &user, &channel).await?;
    let text = required_text("body", &body.body, MAX_BODY_CHARS).map_err(domain_error)?;
    let message = chat_messages::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(user.company_name.clone()),
        channel: Set(channel.key()),
        sender_email: Set(user.email.clone()),
        sender_name: Set(user.name.clone()),
        body: Set(text),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.pool)
    .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
