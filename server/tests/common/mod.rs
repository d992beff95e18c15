#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use platform_authn::{StaticIdentity, VerifiedIdentity};
use platform_db::{DatabaseSettings, DbPool, connect};
use platform_payments::{Order, OrderRequest, PaymentError, PaymentGateway};
use serde_json::{Value, json};
use smarthr_server::{
    config::AppConfig,
    http::{AppState, build_router},
};
use tower::ServiceExt;

pub const KEY_SECRET: &str = "rzp_test_secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const OWNER_TOKEN: &str = "owner-token";
pub const OWNER_EMAIL: &str = "owner@acme.test";
pub const COMPANY: &str = "Acme Labs";
/// The owner's email on an account that never confirmed it.
pub const UNVERIFIED_OWNER_TOKEN: &str = "unverified-owner-token";
/// The owner's verified email, but from a different provider account.
pub const OTHER_ACCOUNT_TOKEN: &str = "other-account-token";

/// Issues sequential order ids without calling out.
#[derive(Default)]
pub struct FakeGateway {
    next: AtomicUsize,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn key_id(&self) -> &str {
        "rzp_test_key"
    }

    fn key_secret(&self) -> &str {
        KEY_SECRET
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<Order, PaymentError> {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Order {
            id: format!("order_test_{n}"),
            amount: request.amount,
            currency: request.currency.clone(),
            receipt: Some(request.receipt.clone()),
            status: "created".into(),
        })
    }
}

pub fn employee_token(email: &str) -> String {
    format!("token:{email}")
}

fn identity(email: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        uid: format!("uid-{email}"),
        email: email.to_string(),
        email_verified: true,
        display_name: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub cookie: Option<String>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_env(&[]).await
    }

    /// Boots the router on a migrated in-memory database. Every employee
    /// email in `EMPLOYEES` gets a login token from `employee_token`.
    pub async fn with_env(overrides: &[(&str, &str)]) -> Self {
        let mut env: HashMap<String, String> = HashMap::from([
            ("COOKIE_SECRET_BASE64".into(), STANDARD.encode([7u8; 64])),
            ("SECURE_COOKIES".into(), "false".into()),
            ("FIREBASE_API_KEY".into(), "test-firebase".into()),
            ("RAZORPAY_KEY_ID".into(), "rzp_test_key".into()),
            ("RAZORPAY_KEY_SECRET".into(), KEY_SECRET.into()),
            ("RAZORPAY_WEBHOOK_SECRET".into(), WEBHOOK_SECRET.into()),
        ]);
        for (key, value) in overrides {
            env.insert((*key).to_string(), (*value).to_string());
        }
        let config = AppConfig::from_lookup(|key| env.get(key).cloned()).unwrap();

        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        Migrator::up(&pool, None).await.unwrap();

        let mut identity = StaticIdentity::default()
            .with_token(OWNER_TOKEN, identity(OWNER_EMAIL))
            .with_token("rival-token", identity("rival@other.test"))
            .with_token(
                UNVERIFIED_OWNER_TOKEN,
                VerifiedIdentity {
                    uid: "uid-unverified".into(),
                    email: OWNER_EMAIL.into(),
                    email_verified: false,
                    display_name: None,
                },
            )
            .with_token(
                OTHER_ACCOUNT_TOKEN,
                VerifiedIdentity {
                    uid: "uid-other-account".into(),
                    email: OWNER_EMAIL.into(),
                    email_verified: true,
                    display_name: None,
                },
            );
        for email in EMPLOYEES {
            identity = identity.with_token(employee_token(email), self::identity(email));
        }

        let state = AppState::new(
            pool.clone(),
            Arc::new(config),
            Arc::new(identity),
            Arc::new(FakeGateway::default()),
        );
        Self {
            router: build_router(state),
            pool,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply {
            status,
            body,
            cookie,
        }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> Reply {
        self.send(Method::GET, uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> Reply {
        self.send(Method::POST, uri, Some(cookie), Some(body)).await
    }

    /// Registers the owner and returns their session cookie.
    pub async fn register_owner(&self) -> String {
        let reply = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "idToken": OWNER_TOKEN, "companyName": COMPANY, "name": "Olive Owner" })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.cookie.expect("session cookie")
    }

    /// Adds an employee as the owner and logs them in.
    pub async fn hire(&self, owner: &str, email: &str, extra: Value) -> (Value, String) {
        let mut body = json!({ "email": email, "name": email.split('@').next().unwrap_or(email) });
        if let (Some(target), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }
        let created = self.post("/api/employees", owner, body).await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
        let cookie = self.login(email).await;
        (created.body, cookie)
    }

    pub async fn login(&self, email: &str) -> String {
        let reply = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "idToken": employee_token(email) })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.cookie.expect("session cookie")
    }
}

pub const EMPLOYEES: [&str; 4] = [
    "ada@acme.test",
    "grace@acme.test",
    "linus@acme.test",
    "ken@acme.test",
];
