//! Pure order-item validation, applied before any line item is written.
//!
//! The checks are deliberately I/O free. Callers fetch the product and the order's current items (typically inside
//! the transaction that will write the line) and pass them in, so the decision is made against the same snapshot the
//! write will see.
//!
//! Stock is checked here and nowhere else. Completing an order does not decrement product stock, so these checks are
//! informational at write time only.

use crate::{
    db_types::{OrderItem, Product},
    traits::CheckoutError,
};

/// Vets one prospective line item against the catalog and the order's existing lines.
///
/// `new_line` distinguishes adding a line from positionally updating one: the duplicate-product check only applies
/// to new lines.
pub fn validate_order_item(
    buyer_id: i64,
    product: &Product,
    quantity: i64,
    existing: &[OrderItem],
    new_line: bool,
) -> Result<(), CheckoutError> {
    if quantity < 1 {
        return Err(CheckoutError::InvalidQuantity(quantity));
    }
    if quantity > product.quantity {
        return Err(CheckoutError::InsufficientStock {
            product_id: product.id,
            requested: quantity,
            in_stock: product.quantity,
        });
    }
    if new_line && existing.iter().any(|item| item.product_id == product.id) {
        return Err(CheckoutError::DuplicateLineItem(product.id));
    }
    if buyer_id == product.seller_id {
        return Err(CheckoutError::SelfPurchaseForbidden(product.id));
    }
    Ok(())
}
