use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::Utc;
use entity::{
    companies::{self, Plan},
    sessions,
    users::{self, Role, UserStatus},
};
use platform_api::{ApiError, ApiResult};
use platform_authn::{AuthnError, VerifiedIdentity};
use products_hr::{normalize_company_name, optional_text};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::domain_error;
use crate::{
    http::AppState,
    session::{SESSION_COOKIE, SessionUser, clear_cookie, start_session},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    id_token: String,
    name: Option<String>,
    company_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    id_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    user: users::Model,
}

async fn verify(state: &AppState, id_token: &str) -> ApiResult<VerifiedIdentity> {
    state
        .identity
        .verify_id_token(id_token)
        .await
        .and_then(VerifiedIdentity::require_verified_email)
        .map_err(|err| match err {
            AuthnError::InvalidToken | AuthnError::MissingEmail => ApiError::Unauthorized,
            AuthnError::UnverifiedEmail => ApiError::forbidden("email address is not verified"),
            AuthnError::Upstream(_) => ApiError::internal(err.into()),
        })
}

#[instrument(name = "auth.register", skip_all)]
async fn register(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Json(body): Json<RegisterBody>,
) -> ApiResult<(StatusCode, PrivateCookieJar, Json<AuthResponse>)> {
    let company_name = normalize_company_name(&body.company_name).map_err(domain_error)?;
    let identity = verify(&state, &body.id_token).await?;

    let email_taken = users::Entity::find()
        .filter(users::Column::Email.eq(identity.email.as_str()))
        .one(&state.pool)
        .await?
        .is_some();
    if email_taken {
        return Err(ApiError::conflict("an account already exists for this email"));
    }
    if companies::Entity::find_by_id(company_name.clone())
        .one(&state.pool)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("company name is already registered"));
    }

    let now = Utc::now();
    let txn = state.pool.begin().await?;
    companies::ActiveModel {
        name: Set(company_name.clone()),
        owner_email: Set(identity.email.clone()),
        plan: Set(Plan::Free),
        seats: Set(0),
        active_until: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        firebase_uid: Set(Some(identity.uid.clone())),
        email: Set(identity.email.clone()),
        name: Set(optional_text(body.name).or(identity.display_name.clone())),
        role: Set(Role::Employer),
        company_name: Set(company_name.clone()),
        status: Set(UserStatus::Active),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(company = %company_name, "company registered");
    let cookie = start_session(&state, user.id, &headers).await?;
    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(AuthResponse { user }),
    ))
}

#[instrument(name = "auth.login", skip_all)]
async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> ApiResult<(PrivateCookieJar, Json<AuthResponse>)> {
    let identity = verify(&state, &body.id_token).await?;

    let by_uid = users::Entity::find()
        .filter(users::Column::FirebaseUid.eq(identity.uid.as_str()))
        .one(&state.pool)
        .await?;
    let user = match by_uid {
        Some(user) => user,
        None => users::Entity::find()
            .filter(users::Column::Email.eq(identity.email.as_str()))
            .one(&state.pool)
            .await?
            .ok_or(ApiError::NotFound)?,
    };

    let user = match user.status {
        UserStatus::Disabled => {
            warn!(user_id = %user.id, "disabled user attempted login");
            return Err(ApiError::forbidden("account disabled"));
        }
        UserStatus::Invited => {
            if user
                .firebase_uid
                .as_deref()
                .is_some_and(|uid| uid != identity.uid)
            {
                warn!(user_id = %user.id, "identity does not match invited account");
                return Err(ApiError::Unauthorized);
            }
            let mut active = user.into_active_model();
            active.firebase_uid = Set(Some(identity.uid.clone()));
            active.status = Set(UserStatus::Active);
            if let Some(display_name) = identity.display_name.clone() {
                if matches!(&active.name, sea_orm::ActiveValue::Unchanged(None)) {
                    active.name = Set(Some(display_name));
                }
            }
            let user = active.update(&state.pool).await?;
            info!(user_id = %user.id, "invited employee activated");
            user
        }
        UserStatus::Active => match user.firebase_uid.as_deref() {
            Some(uid) if uid == identity.uid => user,
            Some(_) => {
                warn!(user_id = %user.id, "identity does not match bound account");
                return Err(ApiError::Unauthorized);
            }
            None => {
                let mut active = user.into_active_model();
                active.firebase_uid = Set(Some(identity.uid.clone()));
                active.update(&state.pool).await?
            }
        },
    };

    let cookie = start_session(&state, user.id, &headers).await?;
    Ok((jar.add(cookie), Json(AuthResponse { user })))
}

async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> ApiResult<(PrivateCookieJar, StatusCode)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(session_id) = Uuid::parse_str(cookie.value()) {
            if let Err(err) = sessions::Entity::delete_by_id(session_id)
                .exec(&state.pool)
                .await
            {
                warn!(%session_id, error = %err, "failed to delete session on logout");
            }
        }
    }
    Ok((jar.remove(clear_cookie()), StatusCode::NO_CONTENT))
}

async fn me(user: SessionUser) -> Json<SessionUser> {
    Json(user)
}
