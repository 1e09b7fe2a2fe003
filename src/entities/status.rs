//! Order lifecycle statuses and their transition table
//!
//! The adjacency table is plain data: [`TRANSITIONS`] lists, for every
//! status, the statuses reachable from it. Business rules that depend on the
//! order itself (material loan) live in the status validator, not here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Validated,
    Preparing,
    Ready,
    Delivering,
    Delivered,
    WaitingMaterialReturn,
    Completed,
    Cancelled,
}

use OrderStatus::*;

/// Directed transition graph, one row per status
pub const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (Pending, &[Validated, Cancelled]),
    (Validated, &[Preparing, Cancelled]),
    (Preparing, &[Ready, Cancelled]),
    (Ready, &[Delivering, Cancelled]),
    (Delivering, &[Delivered, Cancelled]),
    (Delivered, &[WaitingMaterialReturn, Completed, Cancelled]),
    (WaitingMaterialReturn, &[Completed]),
    (Completed, &[]),
    (Cancelled, &[]),
];

/// Human labels shown to customers and operators
const LABELS: &[(OrderStatus, &str)] = &[
    (Pending, "En attente"),
    (Validated, "Validée"),
    (Preparing, "En préparation"),
    (Ready, "Prête"),
    (Delivering, "En cours de livraison"),
    (Delivered, "Livrée"),
    (WaitingMaterialReturn, "En attente du retour de matériel"),
    (Completed, "Terminée"),
    (Cancelled, "Annulée"),
];

impl OrderStatus {
    /// Every status, in lifecycle order
    pub const ALL: [OrderStatus; 9] = [
        Pending,
        Validated,
        Preparing,
        Ready,
        Delivering,
        Delivered,
        WaitingMaterialReturn,
        Completed,
        Cancelled,
    ];

    /// Statuses reachable from this one
    pub fn next_statuses(self) -> &'static [OrderStatus] {
        TRANSITIONS
            .iter()
            .find(|(from, _)| *from == self)
            .map(|(_, next)| *next)
            .unwrap_or(&[])
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        LABELS
            .iter()
            .find(|(status, _)| *status == self)
            .map(|(_, label)| *label)
            .unwrap_or("")
    }

    /// Stable machine name (matches the serde representation)
    pub fn as_str(self) -> &'static str {
        match self {
            Pending => "pending",
            Validated => "validated",
            Preparing => "preparing",
            Ready => "ready",
            Delivering => "delivering",
            Delivered => "delivered",
            WaitingMaterialReturn => "waiting_material_return",
            Completed => "completed",
            Cancelled => "cancelled",
        }
    }

    /// Whether `target` is in this status's adjacency row
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self.next_statuses().contains(&target)
    }

    /// No outgoing transitions
    pub fn is_terminal(self) -> bool {
        self.next_statuses().is_empty()
    }

    /// Any status except COMPLETED and CANCELLED
    pub fn can_be_cancelled(self) -> bool {
        !matches!(self, Completed | Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Unknown order status: {}", s))
    }
}
