//! Idempotency guard for at-least-once external callbacks.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::GatewayKind;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

/// Outcome of claiming an idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    /// First observation of this key; the caller applies effects and then
    /// records the result.
    New,

    /// The key was claimed but no result was stored — a previous attempt is
    /// in flight or died mid-apply. Effects must not be re-applied.
    InFlight,

    /// The key was fully processed before; the recorded result is returned
    /// instead of re-applying effects.
    Replayed(serde_json::Value),
}

/// Deduplication of repeated external callbacks and commands.
///
/// Keys never expire during an order's active lifetime: a gateway or carrier
/// may replay a callback hours later and must still get the recorded result.
#[async_trait]
pub trait IdempotencyGuard: Send + Sync {
    /// Claims a key. The first caller gets [`Claim::New`]; everyone after
    /// sees the claim or the recorded result.
    async fn begin(&self, key: &str) -> Claim;

    /// Records the result snapshot for a claimed key.
    async fn complete(&self, key: &str, result: serde_json::Value);
}

/// Derives the idempotency key for a payment callback.
///
/// The key is a digest of the gateway and its transaction id, so replayed
/// callbacks hash to the same key regardless of payload formatting.
pub fn payment_key(gateway: GatewayKind, transaction_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(gateway.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(transaction_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
struct IdempotencyRecord {
    #[allow(dead_code)] // kept for operator inspection
    first_seen_at: DateTime<Utc>,
    result: Option<serde_json::Value>,
}

/// In-memory idempotency guard.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdempotencyGuard {
    records: Arc<RwLock<HashMap<String, IdempotencyRecord>>>,
}

impl InMemoryIdempotencyGuard {
    /// Creates an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys ever observed.
    pub async fn key_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl IdempotencyGuard for InMemoryIdempotencyGuard {
    async fn begin(&self, key: &str) -> Claim {
        let mut records = self.records.write().await;
        match records.get(key) {
            Some(record) => match &record.result {
                Some(result) => Claim::Replayed(result.clone()),
                None => Claim::InFlight,
            },
            None => {
                records.insert(
                    key.to_string(),
                    IdempotencyRecord {
                        first_seen_at: Utc::now(),
                        result: None,
                    },
                );
                Claim::New
            }
        }
    }

    async fn complete(&self, key: &str, result: serde_json::Value) {
        let mut records = self.records.write().await;
        match records.get_mut(key) {
            Some(record) => record.result = Some(result),
            None => {
                records.insert(
                    key.to_string(),
                    IdempotencyRecord {
                        first_seen_at: Utc::now(),
                        result: Some(result),
                    },
                );
            }
        }
    }
}
