use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, OrderId, Payment, PaymentStatus},
    traits::CheckoutError,
};

pub async fn insert_payment(payment: &NewPayment, conn: &mut SqliteConnection) -> Result<Payment, CheckoutError> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, payment_option) VALUES ($1, $2)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id.value())
    .bind(payment.payment_option.to_string())
    .fetch_one(conn)
    .await?;
    debug!("📝️ Payment #{} ({}) inserted for order {}", payment.id, payment.payment_option, payment.order_id);
    Ok(payment)
}

pub async fn fetch_payment_for_order(
    id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(id.value()).fetch_optional(conn).await?;
    Ok(payment)
}

/// Moves a `Pending` payment to `new_status` and stamps the gateway event id on it, but only if the row is still
/// `Pending` when the statement runs. Concurrent reconcilers race on this guard. Exactly one wins; every loser gets
/// `None` back and must re-read the row to learn what won.
pub(crate) async fn finalize_if_pending(
    order_id: OrderId,
    new_status: PaymentStatus,
    event_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, CheckoutError> {
    let result: Option<Payment> = sqlx::query_as(
        r#"
            UPDATE payments SET
                status = $1,
                event_id = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $3 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(new_status.to_string())
    .bind(event_id)
    .bind(order_id.value())
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

pub(crate) async fn delete_payment_for_order(id: OrderId, conn: &mut SqliteConnection) -> Result<u64, CheckoutError> {
    let result = sqlx::query("DELETE FROM payments WHERE order_id = $1").bind(id.value()).execute(conn).await?;
    Ok(result.rows_affected())
}
