use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use entity::{
    announcements,
    job_postings::{self, JobStatus},
    leave_requests::{self, LeaveStatus},
    payslip_requests::{self, PayslipStatus},
    profile_update_requests::{self, ReviewStatus},
};
use platform_api::ApiResult;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;

use super::{
    employees::{employee_by_email, load_company, seats_in_use},
    teams::visible_teams,
};
use crate::{http::AppState, session::SessionUser};

const LATEST_ANNOUNCEMENTS: u64 = 5;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[derive(Serialize)]
#[serde(tag = "role", rename_all = "camelCase")]
enum Dashboard {
    #[serde(rename_all = "camelCase")]
    Employer {
        employees: u64,
        seat_limit: i32,
        subscription_active: bool,
        pending_leaves: u64,
        pending_profile_updates: u64,
        pending_payslips: u64,
        open_jobs: u64,
        announcements: Vec<announcements::Model>,
    },
    #[serde(rename_all = "camelCase")]
    Employee {
        leave_balance: i32,
        pending_leaves: u64,
        teams: usize,
        announcements: Vec<announcements::Model>,
    },
}

async fn dashboard(State(state): State<AppState>, user: SessionUser) -> ApiResult<Json<Dashboard>> {
    let company = user.company_name.as_str();
    let latest = announcements::Entity::find()
        .filter(announcements::Column::CompanyName.eq(company))
        .order_by_desc(announcements::Column::Pinned)
        .order_by_desc(announcements::Column::CreatedAt)
        .limit(LATEST_ANNOUNCEMENTS)
        .all(&state.pool)
        .await?;
    let pending_leaves = leave_requests::Entity::find()
        .filter(leave_requests::Column::CompanyName.eq(company))
        .filter(leave_requests::Column::Status.eq(LeaveStatus::Pending));

    if !user.is_employer() {
        let employee = employee_by_email(&state.pool, company, &user.email).await?;
        let pending_leaves = pending_leaves
            .filter(leave_requests::Column::EmpEmail.eq(user.email.as_str()))
            .count(&state.pool)
            .await?;
        let teams = visible_teams(&state.pool, &user)
            .await?
            .into_iter()
            .filter(|team| team.has_member(&user.email))
            .count();
        return Ok(Json(Dashboard::Employee {
            leave_balance: employee.leave_balance,
            pending_leaves,
            teams,
            announcements: latest,
        }));
    }

    let now = Utc::now();
    let record = load_company(&state.pool, company).await?;
    let employees = seats_in_use(&state.pool, company).await?;
    let pending_leaves = pending_leaves.count(&state.pool).await?;
    let pending_profile_updates = profile_update_requests::Entity::find()
        .filter(profile_update_requests::Column::CompanyName.eq(company))
        .filter(profile_update_requests::Column::Status.eq(ReviewStatus::Pending))
        .count(&state.pool)
        .await?;
    let pending_payslips = payslip_requests::Entity::find()
        .filter(payslip_requests::Column::CompanyName.eq(company))
        .filter(payslip_requests::Column::Status.eq(PayslipStatus::Pending))
        .count(&state.pool)
        .await?;
    let open_jobs = job_postings::Entity::find()
        .filter(job_postings::Column::CompanyName.eq(company))
        .filter(job_postings::Column::Status.eq(JobStatus::Open))
        .count(&state.pool)
        .await?;

    Ok(Json(Dashboard::Employer {
        employees,
        seat_limit: state.seats.seat_limit(&record, now),
        subscription_active: state.seats.is_active(&record, now),
        pending_leaves,
        pending_profile_updates,
        pending_payslips,
        open_jobs,
        announcements: latest,
    }))
}
