//! # Checkout engine public API
//!
//! The `ce_api` module exposes the programmatic API for the checkout engine.
//!
//! * [`order_query_api`] provides read access to orders, their item lines and totals, and payment state.
//! * [`order_flow_api`] is the primary API for mutating order and payment state: order creation and maintenance,
//!   payment creation, checkout preparation, and reconciling gateway webhook events.
//!
//! The other submodules in this module are support and utility types.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API requires.
//!
//! ```rust,ignore
//! use checkout_engine::{OrderFlowApi, SqliteDatabase, events::EventProducers};
//! let db = SqliteDatabase::new_with_url("sqlite://data/checkout.db", 25).await?;
//! // SqliteDatabase implements CheckoutDatabase
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let order = api.process_new_order(new_order).await?;
//! ```

pub mod order_flow_api;
pub mod order_objects;
pub mod order_query_api;
