//! Cash on delivery.
//!
//! COD has no gateway and nothing to verify; the variant exists so the
//! dispatch table covers every payment mode with the same capability shape.

use async_trait::async_trait;
use common::OrderId;
use domain::GatewayKind;
use serde::Deserialize;

use crate::{GatewayError, PaymentOutcome, PaymentVerifier, SignatureHeaders};

/// Degenerate verifier for cash-on-delivery orders.
#[derive(Debug, Clone, Default)]
pub struct CodVerifier;

#[derive(Deserialize)]
struct CodPayload {
    order_id: String,
}

impl CodVerifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentVerifier for CodVerifier {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Cod
    }

    async fn verify(
        &self,
        payload: &[u8],
        _headers: &SignatureHeaders,
    ) -> Result<PaymentOutcome, GatewayError> {
        let body: CodPayload =
            serde_json::from_slice(payload).map_err(|e| GatewayError::Malformed {
                gateway: GatewayKind::Cod,
                detail: format!("payload: {e}"),
            })?;

        Ok(PaymentOutcome {
            gateway: GatewayKind::Cod,
            success: true,
            order_id: OrderId::parse(&body.order_id).ok(),
            transaction_id: format!("COD-{}", body.order_id),
            provider_code: None,
            amount: None,
            details: serde_json::Value::Null,
        })
    }
}
