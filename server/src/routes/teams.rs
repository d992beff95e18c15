use std::collections::BTreeSet;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use chrono::Utc;
use entity::{employees, teams};
use platform_api::{ApiError, ApiResult};
use products_hr::{access::Permission, normalize_email, required_text};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use super::domain_error;
use crate::{http::AppState, session::SessionUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/{id}", patch(update_team).delete(delete_team))
}

pub(crate) async fn find_team<C: ConnectionTrait>(
    db: &C,
    company_name: &str,
    id: Uuid,
) -> ApiResult<teams::Model> {
    teams::Entity::find_by_id(id)
        .filter(teams::Column::CompanyName.eq(company_name))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Teams visible to `user`: all of them with the teams grant, otherwise
/// only the ones they lead or belong to.
pub(crate) async fn visible_teams<C: ConnectionTrait>(
    db: &C,
    user: &SessionUser,
) -> ApiResult<Vec<teams::Model>> {
    let all = teams::Entity::find()
        .filter(teams::Column::CompanyName.eq(user.company_name.as_str()))
        .order_by_asc(teams::Column::Name)
        .all(db)
        .await?;
    if user.grants.allows(Permission::Teams) {
        return Ok(all);
    }
    Ok(all
        .into_iter()
        .filter(|team| team.has_member(&user.email))
        .collect())
}

async fn list_teams(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<Vec<teams::Model>>> {
    Ok(Json(visible_teams(&state.pool, &user).await?))
}

fn normalize_lead(lead: Option<String>) -> ApiResult<Option<String>> {
    lead.filter(|lead| !lead.trim().is_empty())
        .map(|lead| normalize_email(&lead))
        .transpose()
        .map_err(domain_error)
}

fn normalize_members(members: &[String]) -> ApiResult<Vec<String>> {
    let members = members
        .iter()
        .map(|member| normalize_email(member))
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(domain_error)?;
    Ok(members.into_iter().collect())
}

/// Checks every address belongs to an employee of the company.
async fn ensure_employees<'a, C: ConnectionTrait>(
    db: &C,
    company_name: &str,
    emails: impl IntoIterator<Item = &'a String>,
) -> ApiResult<()> {
    let known: BTreeSet<String> = employees::Entity::find()
        .filter(employees::Column::CompanyName.eq(company_name))
        .all(db)
        .await?
        .into_iter()
        .map(|employee| employee.emp_email)
        .collect();
    if let Some(unknown) = emails.into_iter().find(|email| !known.contains(*email)) {
        return Err(ApiError::invalid(format!("{unknown} is not an employee")));
    }
    Ok(())
}

/// Removes an address from every roster in the company, as lead or member.
pub(crate) async fn drop_from_teams<C: ConnectionTrait>(
    db: &C,
    company_name: &str,
    email: &str,
) -> ApiResult<()> {
    let rosters = teams::Entity::find()
        .filter(teams::Column::CompanyName.eq(company_name))
        .all(db)
        .await?;
    for team in rosters.into_iter().filter(|team| team.has_member(email)) {
        let members: Vec<String> = team
            .member_emails()
            .into_iter()
            .filter(|member| member != email)
            .collect();
        let lead = team.lead_email.clone().filter(|lead| lead != email);
        let mut active = team.into_active_model();
        active.lead_email = Set(lead);
        active.members = Set(serde_json::json!(members));
        active.updated_at = Set(Utc::now().into());
        active.update(db).await?;
    }
    Ok(())
}

async fn ensure_name_free<C: ConnectionTrait>(
    db: &C,
    company_name: &str,
    name: &str,
    except: Option<Uuid>,
) -> ApiResult<()> {
    let mut select = teams::Entity::find()
        .filter(teams::Column::CompanyName.eq(company_name))
        .filter(teams::Column::Name.eq(name));
    if let Some(id) = except {
        select = select.filter(teams::Column::Id.ne(id));
    }
    if select.one(db).await?.is_some() {
        return Err(ApiError::conflict(format!("team {name:?} already exists")));
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTeamBody {
    name: String,
    lead_email: Option<String>,
    #[serde(default)]
    members: Vec<String>,
}

async fn create_team(
    State(state): State<AppState>,
    user: SessionUser,
    Json(body): Json<CreateTeamBody>,
) -> ApiResult<(StatusCode, Json<teams::Model>)> {
    user.require(Permission::Teams)?;
    let name = required_text("name", &body.name, 128).map_err(domain_error)?;
    ensure_name_free(&state.pool, &user.company_name, &name, None).await?;
    let lead = normalize_lead(body.lead_email)?;
    let members = normalize_members(&body.members)?;
    ensure_employees(&state.pool, &user.company_name, lead.iter().chain(&members)).await?;

    let now = Utc::now();
    let team = teams::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(user.company_name.clone()),
        name: Set(name),
        lead_email: Set(lead),
        members: Set(serde_json::json!(members)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.pool)
    .await?;
    Ok((StatusCode::CREATED, Json(team)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTeamBody {
    name: Option<String>,
    /// An empty string clears the lead.
    lead_email: Option<String>,
    members: Option<Vec<String>>,
}

async fn update_team(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTeamBody>,
) -> ApiResult<Json<teams::Model>> {
    user.require(Permission::Teams)?;
    let team = find_team(&state.pool, &user.company_name, id).await?;
    let name = match body.name {
        Some(name) => {
            let name = required_text("name", &name, 128).map_err(domain_error)?;
            ensure_name_free(&state.pool, &user.company_name, &name, Some(id)).await?;
            Some(name)
        }
        None => None,
    };
    // Only the parts of the roster being changed are checked.
    let lead = body
        .lead_email
        .map(|lead| normalize_lead(Some(lead)))
        .transpose()?;
    let members = body
        .members
        .map(|members| normalize_members(&members))
        .transpose()?;
    ensure_employees(
        &state.pool,
        &user.company_name,
        lead.iter().flatten().chain(members.iter().flatten()),
    )
    .await?;

    let mut active = team.into_active_model();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(lead) = lead {
        active.lead_email = Set(lead);
    }
    if let Some(members) = members {
        active.members = Set(serde_json::json!(members));
    }
    active.updated_at = Set(Utc::now().into());
    Ok(Json(active.update(&state.pool).await?))
}

async fn delete_team(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require(Permission::Teams)?;
    let result = teams::Entity::delete_many()
        .filter(teams::Column::Id.eq(id))
        .filter(teams::Column::CompanyName.eq(user.company_name.as_str()))
        .exec(&state.pool)
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
