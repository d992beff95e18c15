use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::{NaiveDate, Utc};
use entity::{
    companies, employees,
    users::{self, Role, UserStatus},
};
use platform_api::{ApiError, ApiResult};
use products_hr::{
    access::{Permission, permissions_from_json, permissions_to_json},
    normalize_email, optional_text,
    profile::validate_phone,
    required_text,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{domain_error, teams::drop_from_teams};
use crate::{
    http::AppState,
    session::{SessionUser, revoke_sessions},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/{id}",
            get(get_employee)
                .patch(update_employee)
                .delete(delete_employee),
        )
        .route("/profile", get(own_profile))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmployeeView {
    id: Uuid,
    emp_email: String,
    name: String,
    designation: Option<String>,
    department: Option<String>,
    joined_on: NaiveDate,
    permissions: Vec<Permission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    monthly_salary: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    leave_balance: Option<i32>,
}

impl EmployeeView {
    /// Directory entry. Contact details and balance are shown to the employer
    /// and to the employee themself; salary only to the employer.
    pub(crate) fn new(model: employees::Model, viewer: &SessionUser) -> Self {
        let private = viewer.is_employer() || viewer.email == model.emp_email;
        let salary = viewer.is_employer().then_some(model.monthly_salary);
        Self {
            monthly_salary: salary,
            ..Self::with_private(model, private)
        }
    }

    /// The full record, for the employee's own profile.
    fn own(model: employees::Model) -> Self {
        Self::with_private(model, true)
    }

    fn with_private(model: employees::Model, private: bool) -> Self {
        Self {
            id: model.id,
            permissions: permissions_from_json(&model.permissions),
            emp_email: model.emp_email,
            name: model.name,
            designation: model.designation,
            department: model.department,
            joined_on: model.joined_on,
            phone: model.phone.filter(|_| private),
            address: model.address.filter(|_| private),
            monthly_salary: private.then_some(model.monthly_salary),
            leave_balance: private.then_some(model.leave_balance),
        }
    }
}

pub(crate) async fn find_employee<C: ConnectionTrait>(
    db: &C,
    company_name: &str,
    id: Uuid,
) -> ApiResult<employees::Model> {
    employees::Entity::find_by_id(id)
        .filter(employees::Column::CompanyName.eq(company_name))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)
}

pub(crate) async fn employee_by_email<C: ConnectionTrait>(
    db: &C,
    company_name: &str,
    email: &str,
) -> ApiResult<employees::Model> {
    employees::Entity::find()
        .filter(employees::Column::CompanyName.eq(company_name))
        .filter(employees::Column::EmpEmail.eq(email))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)
}

pub(crate) async fn company_employees<C: ConnectionTrait>(
    db: &C,
    company_name: &str,
) -> ApiResult<Vec<employees::Model>> {
    Ok(employees::Entity::find()
        .filter(employees::Column::CompanyName.eq(company_name))
        .order_by_asc(employees::Column::Name)
        .all(db)
        .await?)
}

pub(crate) async fn load_company<C: ConnectionTrait>(
    db: &C,
    company_name: &str,
) -> ApiResult<companies::Model> {
    companies::Entity::find_by_id(company_name.to_string())
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)
}

pub(crate) async fn seats_in_use<C: ConnectionTrait>(db: &C, company_name: &str) -> ApiResult<u64> {
    Ok(employees::Entity::find()
        .filter(employees::Column::CompanyName.eq(company_name))
        .count(db)
        .await?)
}

async fn list_employees(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<Vec<EmployeeView>>> {
    let records = company_employees(&state.pool, &user.company_name).await?;
    Ok(Json(
        records
            .into_iter()
            .map(|model| EmployeeView::new(model, &user))
            .collect(),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEmployeeBody {
    email: String,
    name: String,
    phone: Option<String>,
    address: Option<String>,
    designation: Option<String>,
    department: Option<String>,
    #[serde(default)]
    monthly_salary: i64,
    leave_balance: Option<i32>,
    #[serde(default)]
    permissions: Vec<Permission>,
    joined_on: Option<NaiveDate>,
}

#[instrument(name = "employees.create", skip_all, fields(company = %user.company_name))]
async fn create_employee(
    State(state): State<AppState>,
    user: SessionUser,
    Json(body): Json<CreateEmployeeBody>,
) -> ApiResult<(StatusCode, Json<EmployeeView>)> {
    user.require_employer()?;
    let email = normalize_email(&body.email).map_err(domain_error)?;
    let name = required_text("name", &body.name, 256).map_err(domain_error)?;
    let phone = optional_text(body.phone);
    if let Some(phone) = &phone {
        validate_phone(phone).map_err(domain_error)?;
    }
    if body.monthly_salary < 0 {
        return Err(ApiError::invalid("monthly salary must not be negative"));
    }
    let leave_balance = body
        .leave_balance
        .unwrap_or(state.config.default_leave_balance);
    if leave_balance < 0 {
        return Err(ApiError::invalid("leave balance must not be negative"));
    }

    let now = Utc::now();
    let company = load_company(&state.pool, &user.company_name).await?;
    let used = seats_in_use(&state.pool, &user.company_name).await?;
    state
        .seats
        .ensure_seat_available(&company, used, now)
        .map_err(domain_error)?;

    let existing_user = users::Entity::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.pool)
        .await?;
    // A removed employee of this company can be hired again.
    let rehire = match existing_user {
        Some(account)
            if account.status == UserStatus::Disabled
                && account.role == Role::Employee
                && account.company_name == user.company_name =>
        {
            Some(account)
        }
        Some(_) => return Err(ApiError::conflict("a user with this email already exists")),
        None => None,
    };

    let txn = state.pool.begin().await?;
    let employee = employees::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(user.company_name.clone()),
        emp_email: Set(email.clone()),
        name: Set(name.clone()),
        phone: Set(phone),
        address: Set(optional_text(body.address)),
        designation: Set(optional_text(body.designation)),
        department: Set(optional_text(body.department)),
        monthly_salary: Set(body.monthly_salary),
        leave_balance: Set(leave_balance),
        permissions: Set(permissions_to_json(&body.permissions)),
        joined_on: Set(body.joined_on.unwrap_or_else(|| now.date_naive())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    match rehire {
        Some(account) => {
            let mut active = account.into_active_model();
            active.name = Set(Some(name));
            active.status = Set(UserStatus::Invited);
            active.update(&txn).await?;
        }
        None => {
            users::ActiveModel {
                id: Set(Uuid::new_v4()),
                firebase_uid: Set(None),
                email: Set(email),
                name: Set(Some(name)),
                role: Set(Role::Employee),
                company_name: Set(user.company_name.clone()),
                status: Set(UserStatus::Invited),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await?;
        }
    }
    txn.commit().await?;

    info!(seats_used = used + 1, "employee added");
    Ok((StatusCode::CREATED, Json(EmployeeView::new(employee, &user))))
}

async fn get_employee(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EmployeeView>> {
    let employee = find_employee(&state.pool, &user.company_name, id).await?;
    Ok(Json(EmployeeView::new(employee, &user)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateEmployeeBody {
    name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    designation: Option<String>,
    department: Option<String>,
    monthly_salary: Option<i64>,
    leave_balance: Option<i32>,
    permissions: Option<Vec<Permission>>,
}

async fn update_employee(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateEmployeeBody>,
) -> ApiResult<Json<EmployeeView>> {
    user.require_employer()?;
    let employee = find_employee(&state.pool, &user.company_name, id).await?;
    let email = employee.emp_email.clone();
    let mut active = employee.into_active_model();
    let mut renamed = None;
    if let Some(name) = body.name {
        let name = required_text("name", &name, 256).map_err(domain_error)?;
        active.name = Set(name.clone());
        renamed = Some(name);
    }
    if let Some(phone) = body.phone {
        let phone = optional_text(Some(phone));
        if let Some(phone) = &phone {
            validate_phone(phone).map_err(domain_error)?;
        }
        active.phone = Set(phone);
    }
    if let Some(address) = body.address {
        active.address = Set(optional_text(Some(address)));
    }
    if let Some(designation) = body.designation {
        active.designation = Set(optional_text(Some(designation)));
    }
    if let Some(department) = body.department {
        active.department = Set(optional_text(Some(department)));
    }
    if let Some(salary) = body.monthly_salary {
        if salary < 0 {
            return Err(ApiError::invalid("monthly salary must not be negative"));
        }
        active.monthly_salary = Set(salary);
    }
    if let Some(balance) = body.leave_balance {
        if balance < 0 {
            return Err(ApiError::invalid("leave balance must not be negative"));
        }
        active.leave_balance = Set(balance);
    }
    if let Some(permissions) = body.permissions {
        active.permissions = Set(permissions_to_json(&permissions));
    }
    active.updated_at = Set(Utc::now().into());

    let txn = state.pool.begin().await?;
    let updated = active.update(&txn).await?;
    if let Some(name) = renamed {
        users::Entity::update_many()
            .col_expr(users::Column::Name, sea_orm::sea_query::Expr::value(name))
            .filter(users::Column::Email.eq(email))
            .exec(&txn)
            .await?;
    }
    txn.commit().await?;
    Ok(Json(EmployeeView::new(updated, &user)))
}

#[instrument(name = "employees.delete", skip_all, fields(company = %user.company_name))]
async fn delete_employee(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require_employer()?;
    let txn = state.pool.begin().await?;
    let employee = find_employee(&txn, &user.company_name, id).await?;
    let account = users::Entity::find()
        .filter(users::Column::Email.eq(employee.emp_email.as_str()))
        .one(&txn)
        .await?;
    employees::Entity::delete_by_id(employee.id)
        .exec(&txn)
        .await?;
    if let Some(account) = account {
        let account_id = account.id;
        let mut active = account.into_active_model();
        active.status = Set(UserStatus::Disabled);
        active.update(&txn).await?;
        revoke_sessions(&txn, account_id).await?;
    }
    drop_from_teams(&txn, &user.company_name, &employee.emp_email).await?;
    txn.commit().await?;
    info!(employee = %employee.emp_email, "employee removed");
    Ok(StatusCode::NO_CONTENT)
}

async fn own_profile(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<EmployeeView>> {
    user.require_employee()?;
    let employee = employee_by_email(&state.pool, &user.company_name, &user.email).await?;
    Ok(Json(EmployeeView::own(employee)))
}
