//! Razorpay integration.
//!
//! - Order creation over the REST API
//! - Checkout signature verification (`order_id|payment_id`)
//! - Webhook signature verification and event decoding

mod signature;
mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use signature::{sign_payment, sign_webhook, verify_payment_signature, verify_webhook_signature};
pub use webhook::{WebhookEvent, WebhookPayment};

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("gateway rejected request: {0}")]
    Rejected(String),
    #[error("gateway unavailable: {0}")]
    Upstream(String),
    #[error("malformed webhook payload: {0}")]
    MalformedEvent(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Order {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id handed to the checkout widget.
    fn key_id(&self) -> &str;

    /// Secret used to verify checkout signatures.
    fn key_secret(&self) -> &str;

    async fn create_order(&self, request: &OrderRequest) -> Result<Order, PaymentError>;
}

#[derive(Clone, Debug)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub api_base: String,
}

impl RazorpayConfig {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            api_base: RAZORPAY_API_BASE.to_string(),
        }
    }
}

pub struct RazorpayClient {
    config: RazorpayConfig,
    http: reqwest::Client,
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    error: GatewayError,
}

#[derive(Deserialize)]
struct GatewayError {
    description: Option<String>,
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    fn key_id(&self) -> &str {
        &self.config.key_id
    }

    fn key_secret(&self) -> &str {
        &self.config.key_secret
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<Order, PaymentError> {
        let url = format!("{}/orders", self.config.api_base);
        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|err| PaymentError::Upstream(err.to_string()))?;
        let status = response.status();
        if status.is_client_error() {
            let description = response
                .json::<GatewayErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.description)
                .unwrap_or_else(|| status.to_string());
            return Err(PaymentError::Rejected(description));
        }
        if !status.is_success() {
            return Err(PaymentError::Upstream(format!("status {status}")));
        }
        let order: Order = response
            .json()
            .await
            .map_err(|err| PaymentError::Upstream(err.to_string()))?;
        debug!(order_id = %order.id, amount = order.amount, "gateway order created");
        Ok(order)
    }
}
