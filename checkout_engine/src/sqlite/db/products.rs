//! The products table belongs to the storefront. The engine only ever reads from it.
use sqlx::SqliteConnection;

use crate::db_types::Product;

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}
