use thiserror::Error;

use crate::{
    ce_api::order_objects::OrderUpdate,
    db_types::{NewOrder, NewPayment, Order, OrderId, OrderItemLine, Payment, PaymentStatus},
    traits::{data_objects::ReconciliationOutcome, OrderManagement},
};

/// The write side of a checkout engine backend.
///
/// This behaviour includes:
/// * Creating orders atomically, with every line item vetted against the catalog first.
/// * Mutating open orders (line items, addresses) and destroying them with their dependents.
/// * Creating the 1:1 payment record for an order.
/// * Reconciling gateway events onto payment and order state, idempotently.
#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a new order and stores it, with all of its line items, in a single atomic transaction.
    ///
    /// Every line item must pass stock, duplicate and self-purchase checks. If any item fails, nothing is persisted.
    /// Returns the stored order together with its item lines.
    async fn create_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderItemLine>), CheckoutError>;

    /// Applies an [`OrderUpdate`] to an open order in a single atomic transaction.
    ///
    /// Supplied items replace existing lines positionally: the first supplied item updates the oldest line, and so
    /// on. Supplying more items than the order has lines is an error. Address ids, when given, must reference
    /// existing addresses. The order must be `Pending`.
    async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<(Order, Vec<OrderItemLine>), CheckoutError>;

    /// Destroys an order along with its payment and line items, in one transaction. Only `Pending` orders can be
    /// deleted. Returns the order as it was.
    async fn delete_order(&self, id: OrderId) -> Result<Order, CheckoutError>;

    /// Creates the payment record for an order, in `Pending` status.
    ///
    /// Orders have at most one payment. A second create returns [`CheckoutError::OrderAlreadyHasPayment`].
    async fn create_payment(&self, payment: NewPayment) -> Result<Payment, CheckoutError>;

    /// Applies a terminal payment status reported by the gateway, in a single atomic transaction.
    ///
    /// * A `Pending` payment transitions to `new_status` and records `event_id`. When the new status is `Completed`,
    ///   the order is marked `Completed` in the same transaction.
    /// * A payment already finalized by the *same* event id is a replay. Nothing changes.
    /// * A payment already in `new_status` under a *different* event id is a no-op.
    /// * Any other combination is a conflict and returns [`CheckoutError::PaymentAlreadyFinalized`].
    ///
    /// Concurrent applications for one order serialize on the database row. Exactly one caller ever observes
    /// [`ReconciliationOutcome::Applied`].
    async fn apply_terminal_status(
        &self,
        order_id: OrderId,
        new_status: PaymentStatus,
        event_id: &str,
    ) -> Result<ReconciliationOutcome, CheckoutError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), CheckoutError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested product #{0} does not exist")]
    ProductNotFound(i64),
    #[error("The requested address #{0} does not exist")]
    AddressNotFound(i64),
    #[error("Order {0} does not have a payment yet")]
    PaymentNotFound(OrderId),
    #[error("Ordered quantity must be at least 1, not {0}")]
    InvalidQuantity(i64),
    #[error("Cannot order {requested} units of product #{product_id}. Only {in_stock} are in stock")]
    InsufficientStock { product_id: i64, requested: i64, in_stock: i64 },
    #[error("Product #{0} is already in the order")]
    DuplicateLineItem(i64),
    #[error("Buyers may not order their own product #{0}")]
    SelfPurchaseForbidden(i64),
    #[error("Order {0} is closed and can no longer be modified")]
    OrderNotPending(OrderId),
    #[error("Cannot replace {supplied} items. Order {order_id} only has {existing}")]
    TooManyItems { order_id: OrderId, supplied: usize, existing: usize },
    #[error("Order {0} already has a payment")]
    OrderAlreadyHasPayment(OrderId),
    #[error("The payment for order {order_id} is already {current} and cannot become {requested}")]
    PaymentAlreadyFinalized { order_id: OrderId, current: PaymentStatus, requested: PaymentStatus },
    #[error("{0} is not a terminal payment status")]
    NotATerminalStatus(PaymentStatus),
    #[error("Checkout needs a shipping address on order {0}")]
    ShippingAddressNotSet(OrderId),
    #[error("Checkout needs a billing address on order {0}")]
    BillingAddressNotSet(OrderId),
    #[error("The payment for order {0} is already completed")]
    PaymentAlreadyCompleted(OrderId),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutError::DatabaseError(e.to_string())
    }
}
