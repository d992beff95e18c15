use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use entity::{
    leave_requests::{self, LeaveKind, LeaveStatus},
    payroll_runs,
};
use platform_api::{ApiError, ApiResult};
use products_hr::{
    leave::overlapping_working_days,
    payroll::{PayrollInput, PayslipLine, Period, compute_line},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{domain_error, employees::company_employees};
use crate::{http::AppState, session::SessionUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payroll", get(list_runs).post(run_payroll))
        .route("/payroll/{period}", get(get_run))
}

#[derive(Deserialize)]
struct PayrollBody {
    period: String,
    /// Keyed by employee email.
    #[serde(default)]
    bonuses: HashMap<String, i64>,
    #[serde(default)]
    deductions: HashMap<String, i64>,
}

fn by_email(amounts: HashMap<String, i64>) -> HashMap<String, i64> {
    amounts
        .into_iter()
        .map(|(email, amount)| (email.trim().to_lowercase(), amount))
        .collect()
}

pub(crate) async fn find_run<C: ConnectionTrait>(
    db: &C,
    company_name: &str,
    period: Period,
) -> ApiResult<Option<payroll_runs::Model>> {
    Ok(payroll_runs::Entity::find()
        .filter(payroll_runs::Column::CompanyName.eq(company_name))
        .filter(payroll_runs::Column::Period.eq(period.to_string()))
        .one(db)
        .await?)
}

/// Approved unpaid working days per employee that fall inside `period`.
async fn unpaid_leave_days<C: ConnectionTrait>(
    db: &C,
    company_name: &str,
    period: Period,
) -> ApiResult<HashMap<String, i32>> {
    let (first, last) = (period.first_day(), period.last_day());
    let leaves = leave_requests::Entity::find()
        .filter(leave_requests::Column::CompanyName.eq(company_name))
        .filter(leave_requests::Column::Kind.eq(LeaveKind::Unpaid))
        .filter(leave_requests::Column::Status.eq(LeaveStatus::Approved))
        .filter(leave_requests::Column::StartDate.lte(last))
        .filter(leave_requests::Column::EndDate.gte(first))
        .all(db)
        .await?;
    let mut days = HashMap::new();
    for leave in leaves {
        *days.entry(leave.emp_email).or_insert(0) +=
            overlapping_working_days(leave.start_date, leave.end_date, first, last);
    }
    Ok(days)
}

#[instrument(name = "payroll.run", skip_all, fields(company = %user.company_name))]
async fn run_payroll(
    State(state): State<AppState>,
    user: SessionUser,
    Json(body): Json<PayrollBody>,
) -> ApiResult<(StatusCode, Json<payroll_runs::Model>)> {
    user.require_employer()?;
    let period = Period::parse(&body.period).map_err(domain_error)?;
    if find_run(&state.pool, &user.company_name, period)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(format!(
            "payroll for {period} has already been run"
        )));
    }

    let employees = company_employees(&state.pool, &user.company_name).await?;
    if employees.is_empty() {
        return Err(ApiError::invalid("no employees to pay"));
    }
    let bonuses = by_email(body.bonuses);
    let deductions = by_email(body.deductions);
    if let Some(unknown) = bonuses
        .keys()
        .chain(deductions.keys())
        .find(|email| !employees.iter().any(|e| &e.emp_email == *email))
    {
        return Err(ApiError::invalid(format!("{unknown} is not an employee")));
    }
    let unpaid = unpaid_leave_days(&state.pool, &user.company_name, period).await?;

    let lines = employees
        .iter()
        .map(|employee| {
            compute_line(
                &PayrollInput {
                    emp_email: &employee.emp_email,
                    name: &employee.name,
                    monthly_salary: employee.monthly_salary,
                    bonus: bonuses.get(&employee.emp_email).copied().unwrap_or(0),
                    deductions: deductions.get(&employee.emp_email).copied().unwrap_or(0),
                    unpaid_leave_days: unpaid.get(&employee.emp_email).copied().unwrap_or(0),
                },
                period,
            )
        })
        .collect::<Result<Vec<PayslipLine>, _>>()
        .map_err(domain_error)?;
    let total_net = lines.iter().map(|line| line.net).sum::<i64>();
    let lines = serde_json::to_value(&lines).map_err(|err| ApiError::internal(err.into()))?;

    let run = payroll_runs::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(user.company_name.clone()),
        period: Set(period.to_string()),
        lines: Set(lines),
        total_net: Set(total_net),
        created_by: Set(user.email.clone()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.pool)
    .await?;

    info!(%period, employees = employees.len(), total_net, "payroll run recorded");
    Ok((StatusCode::CREATED, Json(run)))
}

async fn list_runs(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<Vec<payroll_runs::Model>>> {
    user.require_employer()?;
    let runs = payroll_runs::Entity::find()
        .filter(payroll_runs::Column::CompanyName.eq(user.company_name.as_str()))
        .order_by_desc(payroll_runs::Column::Period)
        .all(&state.pool)
        .await?;
    Ok(Json(runs))
}

async fn get_run(
    State(state): State<AppState>,
    user: SessionUser,
    Path(period): Path<String>,
) -> ApiResult<Json<payroll_runs::Model>> {
    user.require_employer()?;
    let period = Period::parse(&period).map_err(domain_error)?;
    find_run(&state.pool, &user.company_name, period)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
