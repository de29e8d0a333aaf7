use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment};

/// What happened when a gateway event was reconciled against a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconciliationOutcome {
    /// First delivery of this result: the payment (and possibly the order) transitioned.
    Applied { order: Order, payment: Payment },
    /// The same event id was applied before. Nothing changed and no side effects were re-triggered.
    Replay { payment: Payment },
    /// A different event reported a result the payment already holds. Nothing changed.
    AlreadySettled { payment: Payment },
}

impl ReconciliationOutcome {
    pub fn payment(&self) -> &Payment {
        match self {
            ReconciliationOutcome::Applied { payment, .. } => payment,
            ReconciliationOutcome::Replay { payment } => payment,
            ReconciliationOutcome::AlreadySettled { payment } => payment,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, ReconciliationOutcome::Applied { .. })
    }

    /// Consumes the outcome, returning the transitioned records if this was a first delivery.
    pub fn applied(self) -> Option<(Order, Payment)> {
        match self {
            ReconciliationOutcome::Applied { order, payment } => Some((order, payment)),
            _ => None,
        }
    }
}
