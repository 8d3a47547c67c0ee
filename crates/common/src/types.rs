use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Human-readable order identifier.
///
/// Order ids are monotonically assigned from a sequence and rendered
/// zero-padded (`ORD-000042`) so they sort lexicographically in the same
/// order they were issued. Wraps the raw sequence number to prevent mixing
/// order ids with other numeric identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Creates an order ID from a raw sequence number.
    pub fn from_sequence(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the underlying sequence number.
    pub fn sequence(&self) -> u64 {
        self.0
    }

    /// Parses an order ID back from its display form.
    pub fn parse(s: &str) -> Result<Self, OrderIdParseError> {
        let digits = s
            .strip_prefix("ORD-")
            .ok_or_else(|| OrderIdParseError(s.to_string()))?;
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| OrderIdParseError(s.to_string()))
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ORD-{:06}", self.0)
    }
}

/// Error returned when a string is not a valid order ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIdParseError(pub String);

impl std::fmt::Display for OrderIdParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid order id: {}", self.0)
    }
}

impl std::error::Error for OrderIdParseError {}

/// Monotonic order-number sequence.
///
/// The single source of new order ids. An atomic counter behind a narrow
/// interface rather than a shared mutable global, so concurrent checkouts
/// never observe the same number.
#[derive(Debug)]
pub struct OrderSequence {
    next: AtomicU64,
}

impl OrderSequence {
    /// Creates a sequence that will issue `first` as its next id.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Issues the next order ID.
    pub fn next_id(&self) -> OrderId {
        OrderId(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// Returns the id that would be issued next, without consuming it.
    pub fn peek(&self) -> OrderId {
        OrderId(self.next.load(Ordering::SeqCst))
    }
}

impl Default for OrderSequence {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_display_is_zero_padded() {
        assert_eq!(OrderId::from_sequence(42).to_string(), "ORD-000042");
        assert_eq!(OrderId::from_sequence(1_234_567).to_string(), "ORD-1234567");
    }

    #[test]
    fn order_id_parse_roundtrip() {
        let id = OrderId::from_sequence(42);
        assert_eq!(OrderId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn order_id_parse_rejects_garbage() {
        assert!(OrderId::parse("42").is_err());
        assert!(OrderId::parse("ORD-abc").is_err());
    }

    #[test]
    fn sequence_is_monotonic() {
        let seq = OrderSequence::starting_at(7);
        assert_eq!(seq.next_id().sequence(), 7);
        assert_eq!(seq.next_id().sequence(), 8);
        assert_eq!(seq.peek().sequence(), 9);
    }

    #[test]
    fn concurrent_next_id_never_duplicates() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let seq = Arc::new(OrderSequence::default());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let seq = seq.clone();
            handles.push(std::thread::spawn(move || {
                (0..100).map(|_| seq.next_id().sequence()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate order id {id}");
            }
        }
        assert_eq!(seen.len(), 800);
    }

    #[test]
    fn order_id_serialization_roundtrip() {
        let id = OrderId::from_sequence(99);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
