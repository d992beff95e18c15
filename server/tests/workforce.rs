mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn seat_limit_blocks_new_employees() {
    let app = TestApp::with_env(&[("FREE_SEAT_LIMIT", "2")]).await;
    let owner = app.register_owner().await;
    app.hire(&owner, "ada@acme.test", json!({})).await;
    app.hire(&owner, "grace@acme.test", json!({})).await;

    let third = app
        .post(
            "/api/employees",
            &owner,
            json!({ "email": "linus@acme.test", "name": "Linus" }),
        )
        .await;
    assert_eq!(third.status, StatusCode::FORBIDDEN);
    assert_eq!(third.body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn employee_emails_are_unique() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    app.hire(&owner, "ada@acme.test", json!({})).await;
    let again = app
        .post(
            "/api/employees",
            &owner,
            json!({ "email": "ADA@acme.test", "name": "Ada again" }),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn directory_hides_private_fields_from_colleagues() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    app.hire(
        &owner,
        "ada@acme.test",
        json!({ "monthlySalary": 250000, "phone": "+91 98765 43210" }),
    )
    .await;
    let (_, grace) = app.hire(&owner, "grace@acme.test", json!({})).await;

    let directory = app.get("/api/employees", &grace).await;
    assert_eq!(directory.status, StatusCode::OK);
    let ada = directory
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["empEmail"] == "ada@acme.test")
        .unwrap()
        .clone();
    assert!(ada.get("monthlySalary").is_none());
    assert!(ada.get("phone").is_none());

    let owner_view = app.get("/api/employees", &owner).await;
    let ada = owner_view
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["empEmail"] == "ada@acme.test")
        .unwrap()
        .clone();
    assert_eq!(ada["monthlySalary"], 250000);

    let own_entry = app.get("/api/employees", &grace).await;
    let grace_entry = own_entry
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["empEmail"] == "grace@acme.test")
        .unwrap()
        .clone();
    assert!(grace_entry.get("monthlySalary").is_none());
    assert_eq!(grace_entry["leaveBalance"], 20);

    let forbidden = app
        .post(
            "/api/employees",
            &grace,
            json!({ "email": "x@acme.test", "name": "X" }),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn removing_an_employee_revokes_access() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (ada, cookie) = app.hire(&owner, "ada@acme.test", json!({})).await;
    let id = ada["id"].as_str().unwrap();

    let deleted = app
        .send(
            Method::DELETE,
            &format!("/api/employees/{id}"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    assert_eq!(
        app.get("/api/auth/me", &cookie).await.status,
        StatusCode::UNAUTHORIZED
    );
    let relogin = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "idToken": common::employee_token("ada@acme.test") })),
        )
        .await;
    assert_eq!(relogin.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn updating_an_employee_renames_the_account() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (ada, cookie) = app.hire(&owner, "ada@acme.test", json!({})).await;
    let id = ada["id"].as_str().unwrap();

    let updated = app
        .send(
            Method::PATCH,
            &format!("/api/employees/{id}"),
            Some(&owner),
            Some(json!({ "name": "Ada Lovelace", "permissions": ["leave"], "leaveBalance": 12 })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["permissions"], json!(["leave"]));
    assert_eq!(updated.body["leaveBalance"], 12);

    let me = app.get("/api/auth/me", &cookie).await;
    assert_eq!(me.body["name"], "Ada Lovelace");
    assert_eq!(me.body["permissions"], json!(["leave"]));
}

#[tokio::test]
async fn leave_approval_deducts_balance() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (_, ada) = app.hire(&owner, "ada@acme.test", json!({})).await;
    let (_, grace) = app
        .hire(&owner, "grace@acme.test", json!({ "permissions": ["leave"] }))
        .await;

    let request = app
        .post(
            "/api/leaves",
            &ada,
            json!({
                "kind": "casual",
                "startDate": "2026-03-06",
                "endDate": "2026-03-10",
                "reason": "family visit"
            }),
        )
        .await;
    assert_eq!(request.status, StatusCode::CREATED, "{}", request.body);
    // Friday through Tuesday skips the weekend.
    assert_eq!(request.body["days"], 3);
    assert_eq!(request.body["status"], "pending");
    let id = request.body["id"].as_str().unwrap().to_string();

    let own = app
        .send(
            Method::POST,
            &format!("/api/leaves/{id}/approve"),
            Some(&ada),
            None,
        )
        .await;
    assert_eq!(own.status, StatusCode::FORBIDDEN);

    let pending = app.get("/api/leaves?status=pending", &grace).await;
    assert_eq!(pending.body.as_array().unwrap().len(), 1);

    let approved = app
        .post(
            &format!("/api/leaves/{id}/approve"),
            &grace,
            json!({ "note": "enjoy" }),
        )
        .await;
    assert_eq!(approved.status, StatusCode::OK, "{}", approved.body);
    assert_eq!(approved.body["status"], "approved");
    assert_eq!(approved.body["decidedBy"], "grace@acme.test");

    let profile = app.get("/api/profile", &ada).await;
    assert_eq!(profile.body["leaveBalance"], 17);

    let twice = app
        .send(
            Method::POST,
            &format!("/api/leaves/{id}/approve"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(twice.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn leave_requests_are_validated() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (_, ada) = app
        .hire(&owner, "ada@acme.test", json!({ "leaveBalance": 2 }))
        .await;

    let weekend = app
        .post(
            "/api/leaves",
            &ada,
            json!({ "kind": "casual", "startDate": "2026-03-07", "endDate": "2026-03-08", "reason": "rest" }),
        )
        .await;
    assert_eq!(weekend.status, StatusCode::BAD_REQUEST);

    let backwards = app
        .post(
            "/api/leaves",
            &ada,
            json!({ "kind": "sick", "startDate": "2026-03-10", "endDate": "2026-03-09", "reason": "flu" }),
        )
        .await;
    assert_eq!(backwards.status, StatusCode::BAD_REQUEST);

    let overdrawn = app
        .post(
            "/api/leaves",
            &ada,
            json!({ "kind": "earned", "startDate": "2026-03-02", "endDate": "2026-03-04", "reason": "trip" }),
        )
        .await;
    assert_eq!(overdrawn.status, StatusCode::BAD_REQUEST);

    let unpaid = app
        .post(
            "/api/leaves",
            &ada,
            json!({ "kind": "unpaid", "startDate": "2026-03-02", "endDate": "2026-03-04", "reason": "trip" }),
        )
        .await;
    assert_eq!(unpaid.status, StatusCode::CREATED);

    let employer = app
        .post(
            "/api/leaves",
            &owner,
            json!({ "kind": "casual", "startDate": "2026-03-02", "endDate": "2026-03-02", "reason": "x" }),
        )
        .await;
    assert_eq!(employer.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_the_requester_cancels_pending_leave() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (_, ada) = app.hire(&owner, "ada@acme.test", json!({})).await;
    let (_, grace) = app.hire(&owner, "grace@acme.test", json!({})).await;

    let request = app
        .post(
            "/api/leaves",
            &ada,
            json!({ "kind": "sick", "startDate": "2026-03-02", "endDate": "2026-03-02", "reason": "dentist" }),
        )
        .await;
    let id = request.body["id"].as_str().unwrap().to_string();
    let uri = format!("/api/leaves/{id}/cancel");

    let by_other = app.send(Method::POST, &uri, Some(&grace), None).await;
    assert_eq!(by_other.status, StatusCode::FORBIDDEN);

    let cancelled = app.send(Method::POST, &uri, Some(&ada), None).await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["status"], "cancelled");

    let again = app.send(Method::POST, &uri, Some(&ada), None).await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let own = app.get("/api/leaves", &grace).await;
    assert!(own.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn announcements_follow_permissions() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (_, ada) = app.hire(&owner, "ada@acme.test", json!({})).await;
    let (_, grace) = app
        .hire(
            &owner,
            "grace@acme.test",
            json!({ "permissions": ["announcements"] }),
        )
        .await;

    let denied = app
        .post(
            "/api/announcements",
            &ada,
            json!({ "title": "Hi", "body": "from ada" }),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let pinned = app
        .post(
            "/api/announcements",
            &owner,
            json!({ "title": "Holiday", "body": "Office closed", "pinned": true }),
        )
        .await;
    assert_eq!(pinned.status, StatusCode::CREATED);
    let regular = app
        .post(
            "/api/announcements",
            &grace,
            json!({ "title": "Lunch", "body": "Pizza on Friday" }),
        )
        .await;
    assert_eq!(regular.status, StatusCode::CREATED);

    let list = app.get("/api/announcements", &ada).await;
    let titles: Vec<_> = list
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Holiday", "Lunch"]);

    let id = regular.body["id"].as_str().unwrap();
    let deleted = app
        .send(
            Method::DELETE,
            &format!("/api/announcements/{id}"),
            Some(&grace),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let missing = app
        .send(
            Method::DELETE,
            &format!("/api/announcements/{id}"),
            Some(&grace),
            None,
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboards_summarize_by_role() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (_, ada) = app.hire(&owner, "ada@acme.test", json!({})).await;
    app.post(
        "/api/leaves",
        &ada,
        json!({ "kind": "casual", "startDate": "2026-03-02", "endDate": "2026-03-03", "reason": "rest" }),
    )
    .await;

    let employer = app.get("/api/dashboard", &owner).await;
    assert_eq!(employer.status, StatusCode::OK);
    assert_eq!(employer.body["role"], "employer");
    assert_eq!(employer.body["employees"], 1);
    assert_eq!(employer.body["seatLimit"], 5);
    assert_eq!(employer.body["pendingLeaves"], 1);
    assert_eq!(employer.body["subscriptionActive"], false);

    let employee = app.get("/api/dashboard", &ada).await;
    assert_eq!(employee.body["role"], "employee");
    assert_eq!(employee.body["leaveBalance"], 20);
    assert_eq!(employee.body["pendingLeaves"], 1);
    assert_eq!(employee.body["teams"], 0);
}

#[tokio::test]
async fn removed_employee_can_be_hired_again() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (ada, _) = app.hire(&owner, "ada@acme.test", json!({})).await;
    let id = ada["id"].as_str().unwrap();

    let deleted = app
        .send(
            Method::DELETE,
            &format!("/api/employees/{id}"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let (rehired, cookie) = app
        .hire(&owner, "ada@acme.test", json!({ "name": "Ada Byron" }))
        .await;
    assert_ne!(rehired["id"], ada["id"]);
    let me = app.get("/api/auth/me", &cookie).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["name"], "Ada Byron");
    assert_eq!(me.body["role"], "employee");

    let rival = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "idToken": "rival-token", "companyName": "Other Co" })),
        )
        .await;
    let rival = rival.cookie.unwrap();
    let poached = app
        .post(
            "/api/employees",
            &rival,
            json!({ "email": "ada@acme.test", "name": "Ada" }),
        )
        .await;
    assert_eq!(poached.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn simultaneous_approvals_deduct_once() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (_, ada) = app.hire(&owner, "ada@acme.test", json!({})).await;
    let (_, grace) = app
        .hire(&owner, "grace@acme.test", json!({ "permissions": ["leave"] }))
        .await;

    let request = app
        .post(
            "/api/leaves",
            &ada,
            json!({ "kind": "casual", "startDate": "2026-03-02", "endDate": "2026-03-04", "reason": "trip" }),
        )
        .await;
    let id = request.body["id"].as_str().unwrap().to_string();
    let uri = format!("/api/leaves/{id}/approve");

    let (first, second) = tokio::join!(
        app.send(Method::POST, &uri, Some(&owner), None),
        app.send(Method::POST, &uri, Some(&grace), None),
    );
    let mut statuses = [first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let profile = app.get("/api/profile", &ada).await;
    assert_eq!(profile.body["leaveBalance"], 17);
}

#[tokio::test]
async fn approval_rechecks_the_balance() {
    let app = TestApp::new().await;
    let owner = app.register_owner().await;
    let (ada, cookie) = app.hire(&owner, "ada@acme.test", json!({})).await;
    let id = ada["id"].as_str().unwrap();

    let request = app
        .post(
            "/api/leaves",
            &cookie,
            json!({ "kind": "earned", "startDate": "2026-03-02", "endDate": "2026-03-04", "reason": "trip" }),
        )
        .await;
    let leave_id = request.body["id"].as_str().unwrap().to_string();

    app.send(
        Method::PATCH,
        &format!("/api/employees/{id}"),
        Some(&owner),
        Some(json!({ "leaveBalance": 1 })),
    )
    .await;
    let approved = app
        .send(
            Method::POST,
            &format!("/api/leaves/{leave_id}/approve"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(approved.status, StatusCode::BAD_REQUEST);

    let pending = app.get("/api/leaves?status=pending", &owner).await;
    assert_eq!(pending.body.as_array().unwrap().len(), 1);
    assert_eq!(app.get("/api/profile", &cookie).await.body["leaveBalance"], 1);
}
