//! Storefront Checkout Engine
//!
//! The checkout engine keeps a storefront's orders and their payments consistent with what the payment gateway
//! reports. This library contains the core logic for the engine. It is gateway-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). Currently, Sqlite is the supported backend. You should never
//!    need to access the database directly. Instead, use the public API provided by the checkout engine. The
//!    exception is the data types used in the database. These are defined in the `db_types` module and are public.
//! 2. The checkout engine public API ([`OrderFlowApi`] and [`OrderQueryApi`]). This provides the public-facing
//!    functionality of the engine. It is responsible for managing orders, payments and gateway reconciliation.
//!    Specific backends need to implement the traits in the [`mod@traits`] module in order to act as a backend for
//!    the checkout server.
//!
//! The engine also provides an event that can be subscribed to. When a payment is reconciled as successful, a
//! `PaymentSucceededEvent` is emitted, exactly once per payment. A simple actor framework is used so that you can
//! easily hook into this event and perform custom actions, such as sending a confirmation email.
mod ce_api;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use ce_api::{order_flow_api::OrderFlowApi, order_objects, order_query_api::OrderQueryApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{CheckoutDatabase, CheckoutError, OrderManagement, ReconciliationOutcome};
