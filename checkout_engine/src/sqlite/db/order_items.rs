use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrderItem, OrderId, OrderItem, OrderItemLine},
    traits::CheckoutError,
};

pub async fn insert_order_item(
    order_id: OrderId,
    item: &NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, CheckoutError> {
    let item: OrderItem = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(order_id.value())
    .bind(item.product_id)
    .bind(item.quantity)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Line item #{} ({} x product #{}) added to order {order_id}", item.id, item.quantity, item.product_id);
    Ok(item)
}

/// The raw line items for an order, oldest first. The ordering is what gives positional updates their meaning.
pub async fn fetch_order_items(id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(id.value())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Rewrites a single line item in place. The row keeps its id, so its position in the order is stable.
pub(crate) async fn update_order_item(
    item_id: i64,
    item: &NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, CheckoutError> {
    let result: Option<OrderItem> = sqlx::query_as(
        r#"
            UPDATE order_items SET
                product_id = $1,
                quantity = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item_id)
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| CheckoutError::DatabaseError(format!("Line item #{item_id} vanished during update")))
}

/// The order's line items joined with their products, oldest first. Cost is quantity times the *current* catalog
/// price, computed in the query.
pub async fn fetch_item_lines(id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItemLine>, sqlx::Error> {
    let lines = sqlx::query_as(
        r#"
            SELECT
                oi.id as id,
                oi.order_id as order_id,
                oi.product_id as product_id,
                p.name as name,
                p.description as description,
                p.image as image,
                oi.quantity as quantity,
                p.price as price,
                oi.quantity * p.price as cost
            FROM order_items oi JOIN products p ON oi.product_id = p.id
            WHERE oi.order_id = $1
            ORDER BY oi.id ASC
        "#,
    )
    .bind(id.value())
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

pub(crate) async fn delete_items_for_order(id: OrderId, conn: &mut SqliteConnection) -> Result<u64, CheckoutError> {
    let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(id.value()).execute(conn).await?;
    Ok(result.rows_affected())
}
