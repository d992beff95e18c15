use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::USER_AGENT, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::{Duration, Utc};
use entity::{
    employees, sessions,
    users::{self, Role, UserStatus},
};
use platform_api::{ApiError, ApiResult};
use products_hr::access::{Grants, Permission, permissions_from_json};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use time::Duration as TimeDuration;
use tracing::warn;
use uuid::Uuid;

use crate::http::AppState;

pub const SESSION_COOKIE: &str = "smarthr_session";

/// The signed-in user, resolved from the private session cookie.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(skip)]
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub company_name: String,
    pub permissions: Vec<Permission>,
    #[serde(skip)]
    pub grants: Grants,
}

impl SessionUser {
    pub fn is_employer(&self) -> bool {
        self.grants.is_employer()
    }

    pub fn require_employer(&self) -> ApiResult<()> {
        if self.is_employer() {
            Ok(())
        } else {
            Err(ApiError::forbidden("employer access required"))
        }
    }

    pub fn require_employee(&self) -> ApiResult<()> {
        if self.role == Role::Employee {
            Ok(())
        } else {
            Err(ApiError::forbidden("only employees can do this"))
        }
    }

    pub fn require(&self, permission: Permission) -> ApiResult<()> {
        if self.grants.allows(permission) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "missing permission: {}",
                permission.as_str()
            )))
        }
    }
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };
        load_session(state, &jar).await
    }
}

pub async fn load_session(state: &AppState, jar: &PrivateCookieJar) -> ApiResult<SessionUser> {
    let cookie = jar.get(SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;
    let session_id = Uuid::parse_str(cookie.value()).map_err(|_| ApiError::Unauthorized)?;
    let session = sessions::Entity::find_by_id(session_id)
        .one(&state.pool)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if session.expires_at.with_timezone(&Utc) < Utc::now() {
        if let Err(err) = sessions::Entity::delete_by_id(session_id)
            .exec(&state.pool)
            .await
        {
            warn!(%session_id, error = %err, "failed to delete expired session");
        }
        return Err(ApiError::Unauthorized);
    }
    let user = users::Entity::find_by_id(session.user_id)
        .one(&state.pool)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if user.status != UserStatus::Active {
        return Err(ApiError::Unauthorized);
    }
    let grants = match user.role {
        Role::Employer => Grants::employer(),
        Role::Employee => {
            let permissions = employees::Entity::find()
                .filter(employees::Column::EmpEmail.eq(user.email.as_str()))
                .one(&state.pool)
                .await?
                .map(|employee| permissions_from_json(&employee.permissions))
                .unwrap_or_default();
            Grants::employee(permissions)
        }
    };
    Ok(SessionUser {
        session_id,
        user_id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        company_name: user.company_name,
        permissions: grants.permissions.clone(),
        grants,
    })
}

/// Persists a new session row and returns the cookie that names it.
pub async fn start_session(
    state: &AppState,
    user_id: Uuid,
    headers: &HeaderMap,
) -> ApiResult<Cookie<'static>> {
    let session_id = Uuid::new_v4();
    let now = Utc::now();
    let ttl_days = state.config.session_ttl_days;
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.chars().take(512).collect::<String>());
    sessions::ActiveModel {
        id: Set(session_id),
        user_id: Set(user_id),
        created_at: Set(now.into()),
        expires_at: Set((now + Duration::days(ttl_days)).into()),
        ip: Set(None),
        user_agent: Set(user_agent),
    }
    .insert(&state.pool)
    .await?;

    Ok(Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::days(ttl_days))
        .build())
}

pub fn clear_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Drops every session a user holds, used when access is revoked.
pub async fn revoke_sessions<C: ConnectionTrait>(db: &C, user_id: Uuid) -> ApiResult<()> {
    sessions::Entity::delete_many()
        .filter(sessions::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}
