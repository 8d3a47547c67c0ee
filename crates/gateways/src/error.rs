use domain::GatewayKind;
use thiserror::Error;

/// Errors produced while verifying a gateway callback.
///
/// `InvalidSignature` is security-relevant: the sender could not prove it is
/// the gateway, so the callback must not touch order state. A declined
/// payment is not an error — it is a successful verification with a failed
/// business outcome, carried in [`crate::PaymentOutcome`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The callback's signature or checksum did not verify.
    #[error("invalid signature on {gateway} callback")]
    InvalidSignature { gateway: GatewayKind },

    /// The callback payload could not be parsed into the expected shape.
    #[error("malformed {gateway} callback: {detail}")]
    Malformed {
        gateway: GatewayKind,
        detail: String,
    },

    /// The gateway (or its status API) could not be reached or answered 5xx.
    /// The caller may retry; nothing was applied.
    #[error("{gateway} unavailable: {detail}")]
    Unavailable {
        gateway: GatewayKind,
        detail: String,
    },
}

impl GatewayError {
    /// Returns the gateway the error relates to.
    pub fn gateway(&self) -> GatewayKind {
        match self {
            GatewayError::InvalidSignature { gateway }
            | GatewayError::Malformed { gateway, .. }
            | GatewayError::Unavailable { gateway, .. } => *gateway,
        }
    }
}
