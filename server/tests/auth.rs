mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use entity::{sessions, users};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, prelude::DateTimeWithTimeZone,
    sea_query::Expr,
};
use common::{
    COMPANY, OTHER_ACCOUNT_TOKEN, OWNER_EMAIL, OWNER_TOKEN, TestApp, UNVERIFIED_OWNER_TOKEN,
};
use serde_json::json;

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new().await;
    let reply = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["ok"], true);
    assert_eq!(reply.body["dbOk"], true);
}

#[tokio::test]
async fn register_creates_company_and_session() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;

    let me = app.get("/api/auth/me", &owner).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], OWNER_EMAIL);
    assert_eq!(me.body["role"], "employer");
    assert_eq!(me.body["companyName"], COMPANY);

    let billing = app.get("/api/billing", &owner).await;
    assert_eq!(billing.body["subscription"]["plan"], "free");
    assert_eq!(billing.body["subscription"]["seatLimit"], 5);
}

#[tokio::test]
async fn register_rejects_duplicates() {
    let app = TestApp::new().await;
    app.register_owner().await;

    let same_email = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "idToken": OWNER_TOKEN, "companyName": "Another Co" })),
        )
        .await;
    assert_eq!(same_email.status, StatusCode::CONFLICT);

    let same_company = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "idToken": "rival-token", "companyName": COMPANY })),
        )
        .await;
    assert_eq!(same_company.status, StatusCode::CONFLICT);
    assert_eq!(same_company.body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn bad_tokens_and_missing_sessions_are_unauthorized() {
    let app = TestApp::new().await;
    let bad = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "idToken": "forged" })),
        )
        .await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);

    let anonymous = app.send(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["error"]["code"], "UNAUTHORIZED");

    let tampered = app.get("/api/auth/me", "smarthr_session=not-a-session").await;
    assert_eq!(tampered.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_requires_a_known_account() {
    let app = TestApp::new().await;
    let reply = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "idToken": "rival-token" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;

    let reply = app.send(Method::POST, "/api/auth/logout", Some(&owner), None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let me = app.get("/api/auth/me", &owner).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invited_employee_activates_on_first_login() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (employee, cookie) = app
        .hire(&owner, "ada@acme.test", json!({ "monthlySalary": 100000 }))
        .await;
    assert_eq!(employee["leaveBalance"], 20);

    let me = app.get("/api/auth/me", &cookie).await;
    assert_eq!(me.body["role"], "employee");
    assert_eq!(me.body["companyName"], COMPANY);

    let profile = app.get("/api/profile", &cookie).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["empEmail"], "ada@acme.test");
    assert_eq!(profile.body["monthlySalary"], 100000);
}

#[tokio::test]
async fn unverified_email_cannot_take_over_an_account() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;

    let login = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "idToken": UNVERIFIED_OWNER_TOKEN })),
        )
        .await;
    assert_eq!(login.status, StatusCode::FORBIDDEN);
    assert!(login.cookie.is_none());

    let register = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "idToken": UNVERIFIED_OWNER_TOKEN, "companyName": "Shadow Co" })),
        )
        .await;
    assert_eq!(register.status, StatusCode::FORBIDDEN);

    let me = app.get("/api/auth/me", &owner).await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn bound_account_rejects_a_different_identity() {
    let app = TestApp::new().await;
    app.register_owner().await;

    let other = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "idToken": OTHER_ACCOUNT_TOKEN })),
        )
        .await;
    assert_eq!(other.status, StatusCode::UNAUTHORIZED);

    let original = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "idToken": OWNER_TOKEN })),
        )
        .await;
    assert_eq!(original.status, StatusCode::OK);
    assert_eq!(original.body["user"]["email"], OWNER_EMAIL);
    assert_eq!(original.body["user"]["role"], "employer");
}

#[tokio::test]
async fn expired_sessions_are_removed_on_use() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let account = users::Entity::find()
        .filter(users::Column::Email.eq(OWNER_EMAIL))
        .one(&app.pool)
        .await
        .unwrap()
        .unwrap();

    let past: DateTimeWithTimeZone = (Utc::now() - Duration::minutes(5)).into();
    sessions::Entity::update_many()
        .col_expr(sessions::Column::ExpiresAt, Expr::value(past))
        .filter(sessions::Column::UserId.eq(account.id))
        .exec(&app.pool)
        .await
        .unwrap();

    let me = app.get("/api/auth/me", &owner).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    let remaining = sessions::Entity::find()
        .filter(sessions::Column::UserId.eq(account.id))
        .count(&app.pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
