use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// Published after a payment reaches `Completed` and the enclosing transaction has committed. Replayed gateway
/// events never produce a second one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSucceededEvent {
    pub order: Order,
    /// The buyer's email as reported by the gateway's checkout session, when it supplied one.
    pub buyer_email: Option<String>,
}

impl PaymentSucceededEvent {
    pub fn new(order: Order, buyer_email: Option<String>) -> Self {
        Self { order, buyer_email }
    }
}
