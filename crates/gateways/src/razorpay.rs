//! Razorpay webhook verification.
//!
//! Razorpay signs the raw webhook body with HMAC-SHA256 under the webhook
//! secret and sends the hex digest in `X-Razorpay-Signature`.

use async_trait::async_trait;
use common::OrderId;
use domain::{GatewayKind, Money};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::{GatewayError, PaymentOutcome, PaymentVerifier, SignatureHeaders};

type HmacSha256 = Hmac<Sha256>;

const EVENT_CAPTURED: &str = "payment.captured";
const EVENT_FAILED: &str = "payment.failed";

/// Razorpay webhook credentials.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub webhook_secret: String,
}

/// Verifier for Razorpay webhooks.
pub struct RazorpayVerifier {
    config: RazorpayConfig,
}

#[derive(Deserialize)]
struct WebhookBody {
    event: String,
    payload: WebhookPayload,
}

#[derive(Deserialize)]
struct WebhookPayload {
    payment: PaymentWrapper,
}

#[derive(Deserialize)]
struct PaymentWrapper {
    entity: PaymentEntity,
}

#[derive(Deserialize)]
struct PaymentEntity {
    id: String,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    notes: serde_json::Value,
}

impl RazorpayVerifier {
    pub fn new(config: RazorpayConfig) -> Self {
        Self { config }
    }

    fn malformed(&self, detail: impl Into<String>) -> GatewayError {
        GatewayError::Malformed {
            gateway: GatewayKind::Razorpay,
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl PaymentVerifier for RazorpayVerifier {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Razorpay
    }

    async fn verify(
        &self,
        payload: &[u8],
        headers: &SignatureHeaders,
    ) -> Result<PaymentOutcome, GatewayError> {
        let signature =
            headers
                .get("x-razorpay-signature")
                .ok_or(GatewayError::InvalidSignature {
                    gateway: GatewayKind::Razorpay,
                })?;
        let signature_bytes =
            hex::decode(signature).map_err(|_| GatewayError::InvalidSignature {
                gateway: GatewayKind::Razorpay,
            })?;

        let mut mac = HmacSha256::new_from_slice(self.config.webhook_secret.as_bytes())
            .map_err(|_| self.malformed("webhook secret unusable as HMAC key"))?;
        mac.update(payload);
        mac.verify_slice(&signature_bytes).map_err(|_| {
            tracing::warn!("razorpay webhook failed signature verification");
            GatewayError::InvalidSignature {
                gateway: GatewayKind::Razorpay,
            }
        })?;

        let body: WebhookBody = serde_json::from_slice(payload)
            .map_err(|e| self.malformed(format!("webhook body: {e}")))?;
        let entity = body.payload.payment.entity;

        // The checkout flow stamps our order id into the payment notes.
        let order_id = entity
            .notes
            .get("order_id")
            .and_then(|v| v.as_str())
            .and_then(|s| OrderId::parse(s).ok());

        Ok(PaymentOutcome {
            gateway: GatewayKind::Razorpay,
            success: body.event == EVENT_CAPTURED,
            order_id,
            transaction_id: entity.id,
            provider_code: entity.status,
            amount: entity.amount.map(Money::from_paise),
            details: serde_json::json!({
                "event": body.event,
                "method": entity.method,
                "error_description": entity.error_description,
            }),
        })
    }
}
