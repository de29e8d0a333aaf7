//! Unified read API for orders and payments.

use std::fmt::Debug;

use crate::{
    ce_api::order_objects::{OrderQueryFilter, OrderWithItems},
    db_types::{Order, OrderId, Payment},
    traits::{CheckoutError, OrderManagement},
};

/// The `OrderQueryApi` provides read access to orders, their item lines and payments.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi ({:?})", self.db)
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches an order with its item lines and derived total. Line costs reflect catalog prices as of this call.
    pub async fn fetch_order(&self, id: OrderId) -> Result<OrderWithItems, CheckoutError> {
        let order = self.db.fetch_order(id).await?.ok_or(CheckoutError::OrderNotFound(id))?;
        let items = self.db.fetch_order_items(id).await?;
        Ok(OrderWithItems::new(order, items))
    }

    /// All orders for the given buyer, newest first, without item details.
    pub async fn orders_for_buyer(&self, buyer_id: i64) -> Result<Vec<Order>, CheckoutError> {
        self.db.fetch_orders_for_buyer(buyer_id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, CheckoutError> {
        self.db.search_orders(query).await
    }

    pub async fn fetch_payment_for_order(&self, id: OrderId) -> Result<Payment, CheckoutError> {
        self.db.fetch_payment_for_order(id).await?.ok_or(CheckoutError::PaymentNotFound(id))
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
