use crate::{
    ce_api::order_objects::OrderQueryFilter,
    db_types::{Address, Order, OrderId, OrderItemLine, Payment, Product},
    traits::CheckoutError,
};

/// The read side of a checkout engine backend: queries for orders, item lines, payments and the read-only
/// collaborator tables (products and addresses).
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, CheckoutError>;

    /// All orders placed by the given buyer, newest first.
    async fn fetch_orders_for_buyer(&self, buyer_id: i64) -> Result<Vec<Order>, CheckoutError>;

    /// Fetches orders according to the criteria in the [`OrderQueryFilter`], newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, CheckoutError>;

    /// The order's item lines joined with their products. Prices and costs reflect the catalog as of this call.
    async fn fetch_order_items(&self, id: OrderId) -> Result<Vec<OrderItemLine>, CheckoutError>;

    async fn fetch_payment_for_order(&self, id: OrderId) -> Result<Option<Payment>, CheckoutError>;

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CheckoutError>;

    async fn fetch_address(&self, id: i64) -> Result<Option<Address>, CheckoutError>;
}
