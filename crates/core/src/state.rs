use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle of one invoice against the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    New,
    Purchased,
    Redirected,
    Verified,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PaymentEvent {
    PurchaseSucceeded { transaction_id: String },
    PurchaseFailed { message: String },
    Redirected,
    VerifySucceeded { reference_id: String },
    VerifyFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot apply {event} to a payment in state {from}")]
pub struct TransitionError {
    pub from: PaymentState,
    pub event: &'static str,
}

impl PaymentState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentState::Verified | PaymentState::Failed)
    }

    pub fn apply(self, event: &PaymentEvent) -> Result<PaymentState, TransitionError> {
        use PaymentEvent as E;
        use PaymentState as S;

        let next = match (self, event) {
            (S::New, E::PurchaseSucceeded { .. }) => S::Purchased,
            (S::New, E::PurchaseFailed { .. }) => S::Failed,
            (S::Purchased, E::Redirected) => S::Redirected,
            // a repeated redirect hands out the same payment page again
            (S::Redirected, E::Redirected) => S::Redirected,
            (S::Purchased | S::Redirected, E::VerifySucceeded { .. }) => S::Verified,
            (S::Purchased | S::Redirected, E::VerifyFailed { .. }) => S::Failed,
            (from, event) => {
                return Err(TransitionError {
                    from,
                    event: event.name(),
                })
            }
        };
        Ok(next)
    }
}

impl PaymentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PaymentEvent::PurchaseSucceeded { .. } => "purchase_succeeded",
            PaymentEvent::PurchaseFailed { .. } => "purchase_failed",
            PaymentEvent::Redirected => "redirected",
            PaymentEvent::VerifySucceeded { .. } => "verify_succeeded",
            PaymentEvent::VerifyFailed { .. } => "verify_failed",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentState::New => "new",
            PaymentState::Purchased => "purchased",
            PaymentState::Redirected => "redirected",
            PaymentState::Verified => "verified",
            PaymentState::Failed => "failed",
        };
        f.write_str(s)
    }
}
