mod api;
mod config;
mod error;
mod webhook;

mod data_objects;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{
    CheckoutSession,
    CustomerDetails,
    LineItem,
    NewCheckoutSession,
    SessionObject,
    WebhookEvent,
    CHECKOUT_SESSION_ASYNC_PAYMENT_FAILED,
    CHECKOUT_SESSION_COMPLETED,
};
pub use error::StripeApiError;
pub use webhook::{construct_event, sign_payload, verify_signature, SIGNATURE_HEADER, SIGNATURE_TOLERANCE_SECS};
