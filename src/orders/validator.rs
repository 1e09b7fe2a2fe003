//! Status change validation
//!
//! A pure decision: the validator reads the current status and the
//! material-loan state and answers [`StatusCheck::Valid`] or
//! [`StatusCheck::Invalid`] with a reason. It never mutates the order.

use crate::core::error::OrderError;
use crate::entities::{Order, OrderStatus};
use serde::Serialize;

/// Outcome of a status change check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StatusCheck {
    Valid,
    Invalid { reason: String },
}

impl StatusCheck {
    fn invalid(reason: impl Into<String>) -> Self {
        StatusCheck::Invalid {
            reason: reason.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, StatusCheck::Valid)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            StatusCheck::Valid => None,
            StatusCheck::Invalid { reason } => Some(reason),
        }
    }

    /// Turn a rejection into an `InvalidTransition` error
    pub fn into_result(self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        match self {
            StatusCheck::Valid => Ok(()),
            StatusCheck::Invalid { reason } => Err(OrderError::InvalidTransition { from, to, reason }),
        }
    }
}

/// Material loan state relevant to status changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoanState {
    pub has_loan: bool,
    pub returned: bool,
}

impl LoanState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn pending() -> Self {
        Self {
            has_loan: true,
            returned: false,
        }
    }

    pub fn returned() -> Self {
        Self {
            has_loan: true,
            returned: true,
        }
    }

    pub fn of(order: &Order) -> Self {
        Self {
            has_loan: order.has_material_loan(),
            returned: order.material_returned(),
        }
    }
}

/// Stateless status change validator
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderStatusValidator;

impl OrderStatusValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check a transition against the table, then the material loan rules
    pub fn check(&self, current: OrderStatus, target: OrderStatus, loan: LoanState) -> StatusCheck {
        if current == target {
            return StatusCheck::invalid(format!("order is already {}", current.label()));
        }

        if !current.can_transition_to(target) {
            return StatusCheck::invalid(format!(
                "cannot go from \"{}\" to \"{}\"",
                current.label(),
                target.label()
            ));
        }

        match target {
            OrderStatus::Completed if loan.has_loan && !loan.returned => {
                StatusCheck::invalid("material not yet returned")
            }
            OrderStatus::WaitingMaterialReturn if !loan.has_loan => {
                StatusCheck::invalid("no material loan on this order")
            }
            _ => StatusCheck::Valid,
        }
    }

    pub fn validate_status_change(&self, order: &Order, target: OrderStatus) -> StatusCheck {
        self.check(order.status(), target, LoanState::of(order))
    }
}
