use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::GatewayKind;

use crate::{GatewayError, PaymentOutcome, SignatureHeaders};

/// Capability shared by every payment gateway.
///
/// Implementations authenticate the raw callback with the gateway's own
/// scheme and normalize the result. They must short-circuit with
/// [`GatewayError::InvalidSignature`] before reading any business data out of
/// an unauthenticated payload.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Which gateway this verifier handles.
    fn kind(&self) -> GatewayKind;

    /// Verifies a raw callback and normalizes it into a canonical outcome.
    async fn verify(
        &self,
        payload: &[u8],
        headers: &SignatureHeaders,
    ) -> Result<PaymentOutcome, GatewayError>;
}

/// Dispatch table from gateway tag to verifier.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    verifiers: HashMap<GatewayKind, Arc<dyn PaymentVerifier>>,
}

impl GatewayRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a verifier under its own kind, replacing any previous one.
    pub fn register(mut self, verifier: Arc<dyn PaymentVerifier>) -> Self {
        self.verifiers.insert(verifier.kind(), verifier);
        self
    }

    /// Looks up the verifier for a gateway.
    pub fn get(&self, kind: GatewayKind) -> Option<Arc<dyn PaymentVerifier>> {
        self.verifiers.get(&kind).cloned()
    }
}
