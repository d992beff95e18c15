//! Platform authentication helpers.
//!
//! The browser signs in with the identity provider and hands the server a
//! short-lived ID token. This crate turns that token into a verified
//! [`VerifiedIdentity`]; session cookies are issued by the server itself.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const FIREBASE_LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("identity token rejected")]
    InvalidToken,
    #[error("identity has no email address")]
    MissingEmail,
    #[error("email address is not verified")]
    UnverifiedEmail,
    #[error("identity provider unavailable: {0}")]
    Upstream(String),
}

/// A user as asserted by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
    pub display_name: Option<String>,
}

impl VerifiedIdentity {
    /// Accounts are keyed by email, so an unverified address proves nothing.
    pub fn require_verified_email(self) -> Result<Self, AuthnError> {
        if self.email_verified {
            Ok(self)
        } else {
            Err(AuthnError::UnverifiedEmail)
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity, AuthnError>;
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FirebaseConfig {
    pub api_key: String,
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,
}

fn default_lookup_url() -> String {
    FIREBASE_LOOKUP_URL.to_string()
}

impl FirebaseConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            lookup_url: default_lookup_url(),
        }
    }
}

/// Verifies ID tokens through the Identity Toolkit `accounts:lookup` endpoint.
pub struct FirebaseIdentity {
    config: FirebaseConfig,
    http: reqwest::Client,
}

impl FirebaseIdentity {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    display_name: Option<String>,
}

impl LookupResponse {
    fn into_identity(self) -> Result<VerifiedIdentity, AuthnError> {
        let user = self
            .users
            .into_iter()
            .next()
            .ok_or(AuthnError::InvalidToken)?;
        let email = user
            .email
            .map(|email| email.trim().to_ascii_lowercase())
            .filter(|email| !email.is_empty())
            .ok_or(AuthnError::MissingEmail)?;
        Ok(VerifiedIdentity {
            uid: user.local_id,
            email,
            email_verified: user.email_verified,
            display_name: user.display_name,
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity, AuthnError> {
        if id_token.trim().is_empty() {
            return Err(AuthnError::InvalidToken);
        }
        let response = self
            .http
            .post(&self.config.lookup_url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&serde_json::json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|err| AuthnError::Upstream(err.to_string()))?;
        let status = response.status();
        if status.is_client_error() {
            debug!(%status, "identity provider rejected token");
            return Err(AuthnError::InvalidToken);
        }
        if !status.is_success() {
            return Err(AuthnError::Upstream(format!("status {status}")));
        }
        let body: LookupResponse = response
            .json()
            .await
            .map_err(|err| AuthnError::Upstream(err.to_string()))?;
        body.into_identity()
    }
}

/// Fixed token table, for local development and tests.
#[derive(Default, Debug)]
pub struct StaticIdentity {
    tokens: HashMap<String, VerifiedIdentity>,
}

impl StaticIdentity {
    pub fn with_token(mut self, token: impl Into<String>, identity: VerifiedIdentity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity, AuthnError> {
        self.tokens
            .get(id_token)
            .cloned()
            .ok_or(AuthnError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_response_normalizes_email() {
        let body: LookupResponse = serde_json::from_value(json!({
            "users": [{
                "localId": "uid-1",
                "email": " Ada@Example.COM ",
                "emailVerified": true,
                "displayName": "Ada"
            }]
        }))
        .unwrap();
        let identity = body.into_identity().unwrap();
        assert_eq!(identity.uid, "uid-1");
        assert_eq!(identity.email, "ada@example.com");
        assert!(identity.email_verified);
    }

    #[test]
    fn lookup_without_users_is_invalid() {
        let body: LookupResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(body.into_identity(), Err(AuthnError::InvalidToken)));
    }

    #[test]
    fn lookup_without_email_is_rejected() {
        let body: LookupResponse =
            serde_json::from_value(json!({"users": [{"localId": "uid-2"}]})).unwrap();
        assert!(matches!(body.into_identity(), Err(AuthnError::MissingEmail)));
    }

    #[tokio::test]
    async fn static_identity_only_knows_its_tokens() {
        let identity = VerifiedIdentity {
            uid: "u".into(),
            email: "u@example.com".into(),
            email_verified: true,
            display_name: None,
        };
        let provider = StaticIdentity::default().with_token("good", identity.clone());
        assert_eq!(provider.verify_id_token("good").await.unwrap(), identity);
        assert!(provider.verify_id_token("bad").await.is_err());
    }

    #[test]
    fn unverified_email_is_refused() {
        let identity = VerifiedIdentity {
            uid: "u".into(),
            email: "u@example.com".into(),
            email_verified: false,
            display_name: None,
        };
        assert!(matches!(
            identity.require_verified_email(),
            Err(AuthnError::UnverifiedEmail)
        ));
    }
}
