//! `SqliteDatabase` is a concrete implementation of a checkout engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{addresses, db_url, new_pool, order_items, orders, payments, products};
use crate::{
    ce_api::order_objects::{OrderQueryFilter, OrderUpdate},
    db_types::{
        Address,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderItemLine,
        OrderStatus,
        Payment,
        PaymentStatus,
        Product,
    },
    helpers::validate_order_item,
    traits::{CheckoutDatabase, CheckoutError, OrderManagement, ReconciliationOutcome},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl CheckoutDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Takes a new order, and in a single atomic transaction,
    /// * inserts the order header,
    /// * vets every line item against the catalog (stock, duplicates, self-purchase) and inserts it,
    /// * reads the item lines back at current catalog prices.
    /// If any line fails its checks, the transaction rolls back and nothing is persisted.
    async fn create_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderItemLine>), CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let new_order = orders::insert_order(&order, &mut tx).await?;
        let mut accepted = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let product = products::fetch_product(item.product_id, &mut tx)
                .await?
                .ok_or(CheckoutError::ProductNotFound(item.product_id))?;
            validate_order_item(order.buyer_id, &product, item.quantity, &accepted, true)?;
            let line = order_items::insert_order_item(new_order.id, item, &mut tx).await?;
            accepted.push(line);
        }
        let lines = order_items::fetch_item_lines(new_order.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB with {} line(s)", new_order.id, lines.len());
        Ok((new_order, lines))
    }

    async fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<(Order, Vec<OrderItemLine>), CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(id, &mut tx).await?.ok_or(CheckoutError::OrderNotFound(id))?;
        if order.status != OrderStatus::Pending {
            return Err(CheckoutError::OrderNotPending(id));
        }
        if let Some(items) = &update.items {
            let mut lines = order_items::fetch_order_items(id, &mut tx).await?;
            if items.len() > lines.len() {
                return Err(CheckoutError::TooManyItems {
                    order_id: id,
                    supplied: items.len(),
                    existing: lines.len(),
                });
            }
            for (i, item) in items.iter().enumerate() {
                let product = products::fetch_product(item.product_id, &mut tx)
                    .await?
                    .ok_or(CheckoutError::ProductNotFound(item.product_id))?;
                // A line may keep its product, or take one that no other line holds. Anything else collides with
                // the one-line-per-product rule.
                if lines.iter().enumerate().any(|(j, other)| j != i && other.product_id == item.product_id) {
                    return Err(CheckoutError::DuplicateLineItem(item.product_id));
                }
                validate_order_item(order.buyer_id, &product, item.quantity, &lines, false)?;
                let updated = order_items::update_order_item(lines[i].id, item, &mut tx).await?;
                lines[i] = updated;
            }
        }
        let order = if update.shipping_address_id.is_some() || update.billing_address_id.is_some() {
            if let Some(addr) = update.shipping_address_id {
                addresses::fetch_address(addr, &mut tx).await?.ok_or(CheckoutError::AddressNotFound(addr))?;
            }
            if let Some(addr) = update.billing_address_id {
                addresses::fetch_address(addr, &mut tx).await?.ok_or(CheckoutError::AddressNotFound(addr))?;
            }
            orders::update_addresses(id, update.shipping_address_id, update.billing_address_id, &mut tx).await?
        } else {
            order
        };
        let lines = order_items::fetch_item_lines(id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {id} has been updated");
        Ok((order, lines))
    }

    async fn delete_order(&self, id: OrderId) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(id, &mut tx).await?.ok_or(CheckoutError::OrderNotFound(id))?;
        if order.status != OrderStatus::Pending {
            return Err(CheckoutError::OrderNotPending(id));
        }
        payments::delete_payment_for_order(id, &mut tx).await?;
        let n = order_items::delete_items_for_order(id, &mut tx).await?;
        orders::delete_order(id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {id} and its {n} line(s) are gone");
        Ok(order)
    }

    async fn create_payment(&self, payment: NewPayment) -> Result<Payment, CheckoutError> {
        let order_id = payment.order_id;
        let mut tx = self.pool.begin().await?;
        orders::fetch_order(order_id, &mut tx).await?.ok_or(CheckoutError::OrderNotFound(order_id))?;
        if payments::fetch_payment_for_order(order_id, &mut tx).await?.is_some() {
            return Err(CheckoutError::OrderAlreadyHasPayment(order_id));
        }
        let payment = payments::insert_payment(&payment, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment #{} has been saved for order {order_id}", payment.id);
        Ok(payment)
    }

    /// Reconciles a terminal gateway result onto the payment row, atomically.
    ///
    /// The transition itself rides on a guarded `UPDATE ... WHERE status = 'Pending'`. When that update moves a
    /// row, this call owns the transition: the order flips to `Completed` alongside a completed payment in the
    /// same transaction. When it moves nothing the payment was already settled, and the row decides between
    /// replay, no-op and conflict.
    async fn apply_terminal_status(
        &self,
        order_id: OrderId,
        new_status: PaymentStatus,
        event_id: &str,
    ) -> Result<ReconciliationOutcome, CheckoutError> {
        if !new_status.is_terminal() {
            return Err(CheckoutError::NotATerminalStatus(new_status));
        }
        let mut tx = self.pool.begin().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut tx)
            .await?
            .ok_or(CheckoutError::PaymentNotFound(order_id))?;
        if payment.status == PaymentStatus::Pending {
            if let Some(payment) = payments::finalize_if_pending(order_id, new_status, event_id, &mut tx).await? {
                let order = if new_status == PaymentStatus::Completed {
                    orders::update_order_status(order_id, OrderStatus::Completed, &mut tx).await?
                } else {
                    orders::fetch_order(order_id, &mut tx).await?.ok_or(CheckoutError::OrderNotFound(order_id))?
                };
                tx.commit().await?;
                info!("🗃️ Event {event_id} finalized the payment for order {order_id} as {new_status}");
                return Ok(ReconciliationOutcome::Applied { order, payment });
            }
            // The guard lost a race. Re-read the row and let it decide below.
        }
        let payment = payments::fetch_payment_for_order(order_id, &mut tx)
            .await?
            .ok_or(CheckoutError::PaymentNotFound(order_id))?;
        let outcome = if payment.event_id.as_deref() == Some(event_id) {
            ReconciliationOutcome::Replay { payment }
        } else if payment.status == new_status {
            ReconciliationOutcome::AlreadySettled { payment }
        } else {
            return Err(CheckoutError::PaymentAlreadyFinalized {
                order_id,
                current: payment.status,
                requested: new_status,
            });
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn close(&mut self) -> Result<(), CheckoutError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_buyer(&self, buyer_id: i64) -> Result<Vec<Order>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_buyer(buyer_id, &mut conn).await?;
        Ok(orders)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order_items(&self, id: OrderId) -> Result<Vec<OrderItemLine>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let lines = order_items::fetch_item_lines(id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_payment_for_order(&self, id: OrderId) -> Result<Option<Payment>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_address(&self, id: i64) -> Result<Option<Address>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let address = addresses::fetch_address(id, &mut conn).await?;
        Ok(address)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
