//! The addresses table belongs to the storefront. The engine only ever reads from it.
use sqlx::SqliteConnection;

use crate::db_types::Address;

pub async fn fetch_address(id: i64, conn: &mut SqliteConnection) -> Result<Option<Address>, sqlx::Error> {
    let address = sqlx::query_as("SELECT * FROM addresses WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(address)
}
