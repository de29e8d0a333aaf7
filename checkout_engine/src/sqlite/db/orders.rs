use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    ce_api::order_objects::OrderQueryFilter,
    db_types::{NewOrder, Order, OrderId, OrderStatus},
    traits::CheckoutError,
};

/// Inserts a new order header into the database using the given connection. This is not atomic. You can embed this
/// call inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// Line items are inserted separately; see [`super::order_items::insert_order_item`]. The order starts out as
/// `Pending`.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, CheckoutError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (buyer_id) VALUES ($1)
            RETURNING *;
        "#,
    )
    .bind(order.buyer_id)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order {} inserted for buyer #{}", order.id, order.buyer_id);
    Ok(order)
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id.value()).fetch_optional(conn).await?;
    Ok(order)
}

/// All orders placed by the given buyer, newest first.
pub async fn fetch_orders_for_buyer(buyer_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(buyer_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in descending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

pub(crate) async fn update_order_status(
    id: OrderId,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, CheckoutError> {
    let status = status.to_string();
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id.value())
            .fetch_optional(conn)
            .await?;
    result.ok_or(CheckoutError::OrderNotFound(id))
}

/// Points the order at new shipping and/or billing addresses. A `None` leaves the existing value alone.
pub(crate) async fn update_addresses(
    id: OrderId,
    shipping_address_id: Option<i64>,
    billing_address_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Order, CheckoutError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                shipping_address_id = COALESCE($1, shipping_address_id),
                billing_address_id = COALESCE($2, billing_address_id),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(shipping_address_id)
    .bind(billing_address_id)
    .bind(id.value())
    .fetch_optional(conn)
    .await?;
    result.ok_or(CheckoutError::OrderNotFound(id))
}

pub(crate) async fn delete_order(id: OrderId, conn: &mut SqliteConnection) -> Result<(), CheckoutError> {
    sqlx::query("DELETE FROM orders WHERE id = $1").bind(id.value()).execute(conn).await?;
    debug!("📝️ Order {id} deleted");
    Ok(())
}
