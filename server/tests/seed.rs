mod common;

use axum::http::{Method, StatusCode};
use common::{OWNER_TOKEN, TestApp};
use serde_json::json;
use smarthr_server::seed::{SeedOptions, seed_demo};

#[tokio::test]
async fn seeded_owner_can_sign_in() {
    let app = TestApp::new().await;
    let options = SeedOptions::default();
    assert!(seed_demo(&app.pool, &options).await.unwrap());
    assert!(!seed_demo(&app.pool, &options).await.unwrap());

    let login = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "idToken": OWNER_TOKEN })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.body);
    assert_eq!(login.body["user"]["status"], "active");
    let owner = login.cookie.unwrap();

    let employees = app.get("/api/employees", &owner).await;
    assert_eq!(employees.body.as_array().unwrap().len(), 3);
    let teams = app.get("/api/teams", &owner).await;
    assert_eq!(teams.body[0]["name"], "People Ops");
}
