use serde::Deserialize;
use serde_json::Value;

use crate::PaymentError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookPayment {
    pub payment_id: String,
    pub order_id: String,
}

/// Webhook events the billing flow reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    PaymentCaptured(WebhookPayment),
    OrderPaid(WebhookPayment),
    PaymentFailed(WebhookPayment),
    Other(String),
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct PaymentEntity {
    id: String,
    order_id: Option<String>,
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> Result<Self, PaymentError> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|err| PaymentError::MalformedEvent(err.to_string()))?;
        match envelope.event.as_str() {
            "payment.captured" => Ok(Self::PaymentCaptured(payment(&envelope.payload)?)),
            "order.paid" => Ok(Self::OrderPaid(payment(&envelope.payload)?)),
            "payment.failed" => Ok(Self::PaymentFailed(payment(&envelope.payload)?)),
            _ => Ok(Self::Other(envelope.event)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::PaymentCaptured(_) => "payment.captured",
            Self::OrderPaid(_) => "order.paid",
            Self::PaymentFailed(_) => "payment.failed",
            Self::Other(name) => name,
        }
    }
}

fn payment(payload: &Value) -> Result<WebhookPayment, PaymentError> {
    let entity = payload
        .pointer("/payment/entity")
        .cloned()
        .ok_or_else(|| PaymentError::MalformedEvent("missing payment entity".into()))?;
    let entity: PaymentEntity = serde_json::from_value(entity)
        .map_err(|err| PaymentError::MalformedEvent(err.to_string()))?;
    let order_id = entity
        .order_id
        .or_else(|| {
            payload
                .pointer("/order/entity/id")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .ok_or_else(|| PaymentError::MalformedEvent("missing order id".into()))?;
    Ok(WebhookPayment {
        payment_id: entity.id,
        order_id,
    })
}
