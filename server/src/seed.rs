//! Demo data for local development.

use anyhow::{Context, Result};
use chrono::Utc;
use entity::{
    announcements,
    companies::{self, Plan},
    employees, teams,
    users::{self, Role, UserStatus},
};
use platform_db::DbPool;
use products_hr::{
    access::{Permission, permissions_to_json},
    normalize_company_name, normalize_email,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct SeedOptions {
    pub company_name: String,
    pub owner_email: String,
    pub leave_balance: i32,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            company_name: "Acme Demo".into(),
            owner_email: "owner@acme.test".into(),
            leave_balance: 20,
        }
    }
}

struct DemoEmployee {
    email: &'static str,
    name: &'static str,
    designation: &'static str,
    department: &'static str,
    monthly_salary: i64,
    permissions: &'static [Permission],
}

const DEMO_EMPLOYEES: &[DemoEmployee] = &[
    DemoEmployee {
        email: "priya@acme.test",
        name: "Priya Raman",
        designation: "HR Manager",
        department: "People",
        monthly_salary: 9_000_000,
        permissions: &[Permission::Leave, Permission::Announcements],
    },
    DemoEmployee {
        email: "arjun@acme.test",
        name: "Arjun Mehta",
        designation: "Backend Engineer",
        department: "Engineering",
        monthly_salary: 12_000_000,
        permissions: &[],
    },
    DemoEmployee {
        email: "sara@acme.test",
        name: "Sara Thomas",
        designation: "Recruiter",
        department: "People",
        monthly_salary: 7_000_000,
        permissions: &[Permission::Recruitment],
    },
];

/// Creates a free-plan company with a few invited employees. Returns `false`
/// without touching anything when the company already exists.
pub async fn seed_demo(pool: &DbPool, options: &SeedOptions) -> Result<bool> {
    let company_name = normalize_company_name(&options.company_name)?;
    let owner_email = normalize_email(&options.owner_email)?;
    if companies::Entity::find_by_id(company_name.clone())
        .one(pool)
        .await?
        .is_some()
    {
        info!(company = %company_name, "demo company already present; skipping seed");
        return Ok(false);
    }

    let now = Utc::now();
    let txn = pool.begin().await?;
    companies::ActiveModel {
        name: Set(company_name.clone()),
        owner_email: Set(owner_email.clone()),
        plan: Set(Plan::Free),
        seats: Set(0),
        active_until: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .context("insert demo company")?;
    invite_user(&txn, &company_name, &owner_email, "Demo Owner", Role::Employer).await?;

    for demo in DEMO_EMPLOYEES {
        employees::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_name: Set(company_name.clone()),
            emp_email: Set(demo.email.to_string()),
            name: Set(demo.name.to_string()),
            phone: Set(None),
            address: Set(None),
            designation: Set(Some(demo.designation.to_string())),
            department: Set(Some(demo.department.to_string())),
            monthly_salary: Set(demo.monthly_salary),
            leave_balance: Set(options.leave_balance),
            permissions: Set(permissions_to_json(demo.permissions)),
            joined_on: Set(now.date_naive()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .with_context(|| format!("insert employee {}", demo.email))?;
        invite_user(&txn, &company_name, demo.email, demo.name, Role::Employee).await?;
    }

    teams::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(company_name.clone()),
        name: Set("People Ops".into()),
        lead_email: Set(Some(DEMO_EMPLOYEES[0].email.to_string())),
        members: Set(json!([DEMO_EMPLOYEES[0].email, DEMO_EMPLOYEES[2].email])),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    announcements::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(company_name.clone()),
        title: Set("Welcome to SmartHR".into()),
        body: Set("Leave requests, payslips and team chat now live here.".into()),
        author_email: Set(owner_email),
        pinned: Set(true),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(company = %company_name, employees = DEMO_EMPLOYEES.len(), "demo data seeded");
    Ok(true)
}

async fn invite_user<C: sea_orm::ConnectionTrait>(
    db: &C,
    company_name: &str,
    email: &str,
    name: &str,
    role: Role,
) -> Result<()> {
    users::ActiveModel {
        id: Set(Uuid::new_v4()),
        firebase_uid: Set(None),
        email: Set(email.to_string()),
        name: Set(Some(name.to_string())),
        role: Set(role),
        company_name: Set(company_name.to_string()),
        status: Set(UserStatus::Invited),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .with_context(|| format!("insert user {email}"))?;
    Ok(())
}
