//! Order status machine.
//!
//! ```text
//! pending_payment ──verify──▶ verified ──fulfil──▶ fulfilled
//!        │
//!        └────cancel────▶ cancelled
//! ```
//!
//! Orders are created in `PendingPayment` (the customer pays by UPI outside
//! the site). Every later transition is an admin action.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting manual payment confirmation.
    #[default]
    PendingPayment,
    /// Payment confirmed by an admin.
    Verified,
    /// Goods dispatched.
    Fulfilled,
    /// Terminal; never paid.
    Cancelled,
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move an order from {from} to {to}")]
pub struct StatusTransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::PendingPayment,
        Self::Verified,
        Self::Fulfilled,
        Self::Cancelled,
    ];

    /// Human-readable label, as shown to customers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingPayment => "Pending Payment",
            Self::Verified => "Verified",
            Self::Fulfilled => "Fulfilled",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Machine form used on the wire and in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Verified => "verified",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Fulfilled | Self::Cancelled)
    }

    /// Whether `self -> next` is an edge of the lifecycle.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::PendingPayment, Self::Verified | Self::Cancelled)
                | (Self::Verified, Self::Fulfilled)
        )
    }

    /// Validate a transition, returning the new status.
    ///
    /// # Errors
    ///
    /// Returns [`StatusTransitionError`] for anything that is not a lifecycle edge.
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

    /// Whether the "verify your payment" call-to-action should be shown.
    #[must_use]
    pub const fn shows_payment_prompt(self) -> bool {
        matches!(self, Self::PendingPayment)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    /// Parses labels and machine forms alike: case is ignored and spaces,
    /// dashes and underscores are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Presentation gate for the payment verification prompt.
///
/// Accepts the status as free text (a label from an API payload or a
/// template) and shows the prompt only for pending payment.
#[must_use]
pub fn payment_prompt_visible(status: &str) -> bool {
    status
        .parse::<OrderStatus>()
        .is_ok_and(OrderStatus::shows_payment_prompt)
}
