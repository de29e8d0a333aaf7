//! # Database management and control.
//!
//! This module defines the interface contracts that a storage backend must fulfil in order to drive the checkout
//! engine.
//!
//! ## Orders and payments
//! An order collects line items for a buyer. A payment is the 1:1 record tracking how (and whether) that order got
//! paid. The two are reconciled against gateway webhook events, and the cardinal rule is that an order is `Completed`
//! exactly when its payment is `Completed`, with both flipped in a single transaction.
//!
//! ## Traits
//! * [`CheckoutDatabase`] defines the write side: order creation and mutation, payment creation, and the idempotent
//!   terminal-status reconciliation used by the webhook path.
//! * [`OrderManagement`] defines the read side: fetching orders, item lines, payments and the read-only catalog
//!   collaborators (products and addresses).
mod checkout_database;
mod order_management;

mod data_objects;

pub use checkout_database::{CheckoutDatabase, CheckoutError};
pub use data_objects::ReconciliationOutcome;
pub use order_management::OrderManagement;
