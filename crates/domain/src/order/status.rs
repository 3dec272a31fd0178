//! Order status machine.

use serde::{Deserialize, Serialize};

/// The status of an order after checkout.
///
/// Transitions:
/// ```text
/// Placed ──► Fulfilling ──► Fulfilled
///   │            │
///   └────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Stored and announced, no task work started yet.
    #[default]
    Placed,

    /// Fulfillment tasks are being worked.
    Fulfilling,

    /// All items delivered (terminal).
    Fulfilled,

    /// Abandoned (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order may move from this status to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Placed, OrderStatus::Fulfilling)
                | (OrderStatus::Fulfilling, OrderStatus::Fulfilled)
                | (OrderStatus::Placed | OrderStatus::Fulfilling, OrderStatus::Cancelled)
        )
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Fulfilled | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Fulfilling => "fulfilling",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_placed() {
        assert_eq!(OrderStatus::default(), OrderStatus::Placed);
    }

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Placed.can_transition_to(OrderStatus::Fulfilling));
        assert!(OrderStatus::Fulfilling.can_transition_to(OrderStatus::Fulfilled));
        assert!(!OrderStatus::Placed.can_transition_to(OrderStatus::Fulfilled));
        assert!(!OrderStatus::Fulfilling.can_transition_to(OrderStatus::Placed));
    }

    #[test]
    fn test_cancel_from_non_terminal_states() {
        assert!(OrderStatus::Placed.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Fulfilling.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Fulfilled.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Placed.is_terminal());
        assert!(!OrderStatus::Fulfilling.is_terminal());
        assert!(OrderStatus::Fulfilled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_serialization_matches_display() {
        for status in [
            OrderStatus::Placed,
            OrderStatus::Fulfilling,
            OrderStatus::Fulfilled,
            OrderStatus::Cancelled,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}
