//! JSON API, one module per feature.

mod announcements;
mod auth;
mod billing;
mod chat;
mod dashboard;
mod employees;
mod jobs;
mod leaves;
mod payroll;
mod payslips;
mod profile_updates;
mod teams;
mod webhooks;

use axum::Router;
use platform_api::ApiError;
use products_hr::DomainError;

use crate::http::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(employees::router())
        .merge(announcements::router())
        .merge(leaves::router())
        .merge(payroll::router())
        .merge(payslips::router())
        .merge(teams::router())
        .merge(chat::router())
        .merge(jobs::router())
        .merge(profile_updates::router())
        .merge(billing::router())
        .merge(webhooks::router())
}

pub(crate) fn domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::SeatLimitReached { .. } => ApiError::forbidden(err.to_string()),
        DomainError::InsufficientBalance { .. } | DomainError::Invalid(_) => {
            ApiError::invalid(err.to_string())
        }
    }
}

/// Optional note from whoever approves or rejects.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct DecisionBody {
    #[serde(default)]
    pub note: Option<String>,
}

impl DecisionBody {
    pub fn note(self) -> Option<String> {
        products_hr::optional_text(self.note)
    }
}
