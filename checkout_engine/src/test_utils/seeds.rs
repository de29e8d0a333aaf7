//! Inserts rows into the storefront-owned tables. The engine proper never writes to these, so tests seed them here.
use scs_common::Money;
use sqlx::SqlitePool;

use crate::db_types::{Address, NewAddress, NewProduct, Product};

pub async fn seed_product(product: &NewProduct, pool: &SqlitePool) -> Product {
    sqlx::query_as(
        r#"
            INSERT INTO products (seller_id, name, description, image, price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(product.seller_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.image)
    .bind(product.price.value())
    .bind(product.quantity)
    .fetch_one(pool)
    .await
    .expect("Error seeding product")
}

pub async fn seed_address(address: &NewAddress, pool: &SqlitePool) -> Address {
    sqlx::query_as(
        r#"
            INSERT INTO addresses (buyer_id, street, city, state, country, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(address.buyer_id)
    .bind(&address.street)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.country)
    .bind(&address.postal_code)
    .fetch_one(pool)
    .await
    .expect("Error seeding address")
}

/// A catalog product with sensible defaults for tests that only care about price and stock.
pub fn test_product(seller_id: i64, name: &str, price_in_cents: i64, quantity: i64) -> NewProduct {
    NewProduct {
        seller_id,
        name: name.to_string(),
        description: format!("{name} (test catalog entry)"),
        image: format!("/media/{}.png", name.to_lowercase().replace(' ', "_")),
        price: Money::from_cents(price_in_cents),
        quantity,
    }
}

pub fn test_address(buyer_id: i64) -> NewAddress {
    NewAddress {
        buyer_id,
        street: "14 Main Road".to_string(),
        city: "Cape Town".to_string(),
        state: "Western Cape".to_string(),
        country: "South Africa".to_string(),
        postal_code: "8001".to_string(),
    }
}
