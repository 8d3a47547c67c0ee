//! Append-only status history for an order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// A single entry in an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// The status the order entered.
    pub status: OrderStatus,

    /// When the transition happened.
    pub at: DateTime<Utc>,

    /// Human-readable note describing the transition.
    pub note: String,
}

/// The ordered, append-only audit trail of an order's lifecycle.
///
/// Entries are only ever appended; nothing exposes mutation or removal, so
/// the history can always reconstruct the order's full transition sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusHistory {
    entries: Vec<StatusEntry>,
}

impl StatusHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry recording a transition into `status`.
    pub fn append(&mut self, status: OrderStatus, note: impl Into<String>) {
        self.entries.push(StatusEntry {
            status,
            at: Utc::now(),
            note: note.into(),
        });
    }

    /// Returns all entries in insertion order.
    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Returns the most recent entry.
    pub fn last(&self) -> Option<&StatusEntry> {
        self.entries.last()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no transitions have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts entries recording a transition into `status`.
    pub fn count_of(&self, status: OrderStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order() {
        let mut history = StatusHistory::new();
        history.append(OrderStatus::Pending, "order created");
        history.append(OrderStatus::Processing, "payment confirmed");

        let statuses: Vec<_> = history.entries().iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![OrderStatus::Pending, OrderStatus::Processing]);
        assert_eq!(history.last().unwrap().note, "payment confirmed");
    }

    #[test]
    fn count_of_filters_by_status() {
        let mut history = StatusHistory::new();
        history.append(OrderStatus::Pending, "order created");
        history.append(OrderStatus::Processing, "payment confirmed");
        assert_eq!(history.count_of(OrderStatus::Processing), 1);
        assert_eq!(history.count_of(OrderStatus::Shipped), 0);
    }

    #[test]
    fn timestamps_are_non_decreasing() {
        let mut history = StatusHistory::new();
        history.append(OrderStatus::Pending, "a");
        history.append(OrderStatus::Processing, "b");
        let entries = history.entries();
        assert!(entries[0].at <= entries[1].at);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut history = StatusHistory::new();
        history.append(OrderStatus::Pending, "order created");

        let json = serde_json::to_string(&history).unwrap();
        let back: StatusHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(history, back);
    }
}
