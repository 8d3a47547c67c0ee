//! PhonePe callback verification.
//!
//! PhonePe sends the status document base64-encoded in the `response` field
//! and authenticates it with an `X-VERIFY` header:
//! `sha256(base64_response + "/pg/v1/status" + salt_key) + "###" + salt_index`.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use common::OrderId;
use domain::{GatewayKind, Money};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{GatewayError, PaymentOutcome, PaymentVerifier, SignatureHeaders};

const STATUS_PATH: &str = "/pg/v1/status";
const SUCCESS_CODE: &str = "PAYMENT_SUCCESS";

/// PhonePe merchant credentials.
#[derive(Debug, Clone)]
pub struct PhonePeConfig {
    pub salt_key: String,
    pub salt_index: String,
}

/// Verifier for PhonePe server-to-server callbacks.
pub struct PhonePeVerifier {
    config: PhonePeConfig,
}

#[derive(Deserialize)]
struct CallbackBody {
    response: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusDocument {
    code: String,
    #[serde(default)]
    message: Option<String>,
    data: StatusData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusData {
    merchant_transaction_id: String,
    transaction_id: String,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    state: Option<String>,
}

impl PhonePeVerifier {
    pub fn new(config: PhonePeConfig) -> Self {
        Self { config }
    }

    fn expected_checksum(&self, base64_response: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(base64_response.as_bytes());
        hasher.update(STATUS_PATH.as_bytes());
        hasher.update(self.config.salt_key.as_bytes());
        format!("{:x}###{}", hasher.finalize(), self.config.salt_index)
    }

    fn malformed(&self, detail: impl Into<String>) -> GatewayError {
        GatewayError::Malformed {
            gateway: GatewayKind::PhonePe,
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl PaymentVerifier for PhonePeVerifier {
    fn kind(&self) -> GatewayKind {
        GatewayKind::PhonePe
    }

    async fn verify(
        &self,
        payload: &[u8],
        headers: &SignatureHeaders,
    ) -> Result<PaymentOutcome, GatewayError> {
        let x_verify = headers
            .get("x-verify")
            .ok_or(GatewayError::InvalidSignature {
                gateway: GatewayKind::PhonePe,
            })?;

        let body: CallbackBody = serde_json::from_slice(payload)
            .map_err(|e| self.malformed(format!("callback body: {e}")))?;

        let expected = self.expected_checksum(&body.response);
        if !constant_time_eq(expected.as_bytes(), x_verify.as_bytes()) {
            tracing::warn!("phonepe callback failed checksum verification");
            return Err(GatewayError::InvalidSignature {
                gateway: GatewayKind::PhonePe,
            });
        }

        let decoded = BASE64
            .decode(body.response.as_bytes())
            .map_err(|e| self.malformed(format!("base64 response: {e}")))?;
        let status: StatusDocument = serde_json::from_slice(&decoded)
            .map_err(|e| self.malformed(format!("status document: {e}")))?;

        Ok(PaymentOutcome {
            gateway: GatewayKind::PhonePe,
            success: status.code == SUCCESS_CODE,
            order_id: OrderId::parse(&status.data.merchant_transaction_id).ok(),
            transaction_id: status.data.transaction_id,
            provider_code: Some(status.code),
            amount: status.data.amount.map(Money::from_paise),
            details: serde_json::json!({
                "state": status.data.state,
                "message": status.message,
            }),
        })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
