use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use platform_api::{ApiError, ApiResult};
use platform_payments::{WebhookEvent, verify_webhook_signature};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use super::billing::{apply_payment, mark_failed, payment_log_by_order};
use crate::http::AppState;

const SIGNATURE_HEADER: &str = "x-razorpay-signature";

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/razorpay", post(razorpay_webhook))
}

#[instrument(name = "webhooks.razorpay", skip_all)]
async fn razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    if !verify_webhook_signature(&state.config.razorpay_webhook_secret, &body, signature) {
        warn!("webhook signature mismatch");
        return Err(ApiError::Unauthorized);
    }

    let event = WebhookEvent::parse(&body).map_err(|err| ApiError::invalid(err.to_string()))?;
    match &event {
        WebhookEvent::PaymentCaptured(payment) | WebhookEvent::OrderPaid(payment) => {
            if payment_log_by_order(&state.pool, &payment.order_id)
                .await?
                .is_none()
            {
                warn!(event = event.name(), order_id = %payment.order_id, "webhook for unknown order");
            } else if apply_payment(&state, &payment.order_id, &payment.payment_id).await? {
                info!(event = event.name(), order_id = %payment.order_id, "payment applied from webhook");
            } else {
                info!(event = event.name(), order_id = %payment.order_id, "payment already applied");
            }
        }
        WebhookEvent::PaymentFailed(payment) => {
            match payment_log_by_order(&state.pool, &payment.order_id).await? {
                Some(log) => {
                    mark_failed(&state.pool, log, Some(&payment.payment_id)).await?;
                    info!(order_id = %payment.order_id, "payment failed");
                }
                None => warn!(order_id = %payment.order_id, "failure for unknown order"),
            }
        }
        WebhookEvent::Other(name) => info!(event = %name, "webhook event ignored"),
    }
    Ok(Json(json!({ "status": "ok" })))
}
