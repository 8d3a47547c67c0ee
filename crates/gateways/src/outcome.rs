use std::collections::BTreeMap;

use common::OrderId;
use domain::{GatewayKind, Money};
use serde::{Deserialize, Serialize};

/// Canonical, gateway-independent result of verifying a payment callback.
///
/// `success == false` means the gateway authenticated the callback but the
/// payment itself failed — a legitimate business event, distinct from a
/// verification failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// Which gateway produced this outcome.
    pub gateway: GatewayKind,

    /// Whether the payment was captured.
    pub success: bool,

    /// The order this payment belongs to, as referenced by the gateway
    /// payload. `None` when the payload carried no parseable reference.
    pub order_id: Option<OrderId>,

    /// The gateway's transaction identifier; the idempotency key is derived
    /// from this.
    pub transaction_id: String,

    /// Gateway-specific status/result code.
    pub provider_code: Option<String>,

    /// Amount reported by the gateway, when present.
    pub amount: Option<Money>,

    /// Normalized details retained for the audit trail. Raw signatures and
    /// credentials are never stored here.
    pub details: serde_json::Value,
}

/// The subset of callback HTTP headers relevant to signature verification.
///
/// Header names are matched case-insensitively, the way HTTP requires.
#[derive(Debug, Clone, Default)]
pub struct SignatureHeaders {
    headers: BTreeMap<String, String>,
}

impl SignatureHeaders {
    /// Creates an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Builder-style insert for tests and call sites.
    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Looks up a header by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for SignatureHeaders {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
