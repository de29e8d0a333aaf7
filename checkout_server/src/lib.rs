//! # Storefront Checkout Server
//! This module hosts the REST server for the checkout subsystem. It is responsible for:
//! Serving the order and payment endpoints to authenticated buyers.
//! Opening hosted checkout sessions with the payment gateway.
//! Listening for incoming webhook deliveries from the gateway and reconciling them against local payments.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/orders/...`: The authenticated order, payment and checkout session routes.
//! * `/webhook/stripe`: The webhook route for receiving checkout results from the payment gateway.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod mailer;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod stripe_routes;

#[cfg(test)]
mod endpoint_tests;
