use std::time::Duration;

use log::*;
use scs_common::Secret;

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Base URL for the Stripe REST API. Only overridden in tests.
    pub api_url: String,
    pub secret_key: Secret<String>,
    /// Shared secret used to verify webhook signatures.
    pub webhook_secret: Secret<String>,
    /// Where Stripe redirects the buyer after a successful / cancelled checkout.
    pub success_url: String,
    pub cancel_url: String,
    /// Public base URL of this backend, used to build absolute product image URLs for checkout line items.
    pub backend_url: String,
    pub request_timeout: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            success_url: "http://localhost:3000/payment-success".to_string(),
            cancel_url: "http://localhost:3000/payment-cancelled".to_string(),
            backend_url: "http://localhost:8360".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let api_url = std::env::var("SCS_STRIPE_API_URL").unwrap_or_else(|_| DEFAULT_STRIPE_API_URL.to_string());
        let secret_key = Secret::new(std::env::var("SCS_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("SCS_STRIPE_SECRET_KEY not set. Checkout session calls will be rejected by Stripe.");
            "sk_test_00000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("SCS_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("SCS_STRIPE_WEBHOOK_SECRET not set. Incoming webhooks will fail signature verification.");
            "whsec_00000000000000".to_string()
        }));
        let success_url = std::env::var("SCS_PAYMENT_SUCCESS_URL").unwrap_or_else(|_| {
            warn!("SCS_PAYMENT_SUCCESS_URL not set, using {}", defaults.success_url);
            defaults.success_url.clone()
        });
        let cancel_url = std::env::var("SCS_PAYMENT_CANCEL_URL").unwrap_or_else(|_| {
            warn!("SCS_PAYMENT_CANCEL_URL not set, using {}", defaults.cancel_url);
            defaults.cancel_url.clone()
        });
        let backend_url = std::env::var("SCS_BACKEND_URL").unwrap_or_else(|_| {
            warn!("SCS_BACKEND_URL not set, using {}", defaults.backend_url);
            defaults.backend_url.clone()
        });
        let request_timeout = std::env::var("SCS_STRIPE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        Self { api_url, secret_key, webhook_secret, success_url, cancel_url, backend_url, request_timeout }
    }
}
