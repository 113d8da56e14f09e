//! Order status lifecycle.
//!
//! ```text
//! pending ──► processing ──► shipped ──► delivered
//!    │            │
//!    └────────────┴──► cancelled
//! ```
//!
//! The storefront only ever assigns the initial status. Every later move is
//! made by the fulfillment tooling through [`OrderStatus::transition_to`].

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::product::ParseEnumError;

/// Where an order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// A status change the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move order from {from} to {to}")]
pub struct StatusTransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Every status.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The snake-case name stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
        )
    }

    /// Move to `next` if the lifecycle allows it.
    ///
    /// # Errors
    ///
    /// Returns [`StatusTransitionError`] for skipped, backward, repeated or
    /// post-terminal moves.
    pub const fn transition_to(self, next: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusTransitionError {
                from: self,
                to: next,
            })
        }
    }

    /// The step tracker shown to customers for this status.
    #[must_use]
    pub fn tracker(&self) -> StatusTracker {
        StatusTracker::for_status(*self)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError::new("order status", s))
    }
}

/// Progress of one tracker step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Current,
    Upcoming,
}

/// One labelled step of the order tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerStep {
    pub label: &'static str,
    pub state: StepState,
}

/// Visual step tracker derived purely from the current status.
///
/// There is no stored history: the steps before the current one are shown
/// as completed and the ones after it as upcoming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTracker {
    pub steps: [TrackerStep; 4],
    pub cancelled: bool,
}

impl StatusTracker {
    const LABELS: [&'static str; 4] = ["Order Placed", "Processing", "Shipped", "Delivered"];

    /// Build the tracker for `status`.
    #[must_use]
    pub fn for_status(status: OrderStatus) -> Self {
        // (steps completed, step in progress)
        let (completed, current) = match status {
            OrderStatus::Pending | OrderStatus::Processing => (1, Some(1)),
            OrderStatus::Shipped => (2, Some(2)),
            OrderStatus::Delivered => (4, None),
            OrderStatus::Cancelled => (1, None),
        };

        let mut index = 0;
        let steps = Self::LABELS.map(|label| {
            let state = if index < completed {
                StepState::Completed
            } else if Some(index) == current {
                StepState::Current
            } else {
                StepState::Upcoming
            };
            index += 1;
            TrackerStep { label, state }
        });

        Self {
            steps,
            cancelled: status == OrderStatus::Cancelled,
        }
    }

    /// Number of completed steps.
    #[must_use]
    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.state == StepState::Completed)
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_lifecycle_is_allowed() {
        let status = OrderStatus::Pending
            .transition_to(OrderStatus::Processing)
            .and_then(|s| s.transition_to(OrderStatus::Shipped))
            .and_then(|s| s.transition_to(OrderStatus::Delivered))
            .unwrap();
        assert_eq!(status, OrderStatus::Delivered);
        assert!(status.is_terminal());
    }

    #[test]
    fn test_cancellation_only_before_shipping() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_skips_and_backward_moves_are_rejected() {
        let err = OrderStatus::Pending
            .transition_to(OrderStatus::Shipped)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot move order from pending to shipped");

        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn test_status_parses_from_database_names() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    fn states(status: OrderStatus) -> Vec<StepState> {
        status.tracker().steps.iter().map(|s| s.state).collect()
    }

    #[test]
    fn test_tracker_for_each_status() {
        use StepState::{Completed, Current, Upcoming};

        assert_eq!(
            states(OrderStatus::Pending),
            vec![Completed, Current, Upcoming, Upcoming]
        );
        assert_eq!(
            states(OrderStatus::Processing),
            vec![Completed, Current, Upcoming, Upcoming]
        );
        assert_eq!(
            states(OrderStatus::Shipped),
            vec![Completed, Completed, Current, Upcoming]
        );
        assert_eq!(
            states(OrderStatus::Delivered),
            vec![Completed, Completed, Completed, Completed]
        );
    }

    #[test]
    fn test_cancelled_tracker() {
        let tracker = OrderStatus::Cancelled.tracker();
        assert!(tracker.cancelled);
        assert_eq!(tracker.completed_steps(), 1);
    }
}
