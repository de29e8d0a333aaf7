use scs_common::Money;
use serde::{Deserialize, Serialize};

use crate::StripeApiError;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const CHECKOUT_SESSION_ASYNC_PAYMENT_FAILED: &str = "checkout.session.async_payment_failed";

/// One line of a checkout session, built from an order item and its product.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LineItem {
    pub name: String,
    pub description: String,
    /// Absolute, publicly reachable image URL. Stripe fetches it to render the checkout page.
    pub image_url: String,
    /// Unit price in minor currency units (cents).
    pub unit_amount: Money,
    pub quantity: i64,
}

/// Everything needed to open a hosted checkout session for one order.
#[derive(Debug, Clone, Default)]
pub struct NewCheckoutSession {
    pub order_id: i64,
    pub line_items: Vec<LineItem>,
}

/// The session object returned by `POST /v1/checkout/sessions`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted checkout page the buyer is redirected to.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookEvent {
    /// Gateway-assigned event id (`evt_...`). Unique per delivery attempt chain, reused on redelivery.
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventData {
    pub object: SessionObject,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionObject {
    pub id: String,
    #[serde(default)]
    pub metadata: SessionMetadata,
    pub customer_details: Option<CustomerDetails>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionMetadata {
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
}

impl WebhookEvent {
    /// True for the event types this subsystem reconciles. Everything else is acknowledged and dropped.
    pub fn is_checkout_event(&self) -> bool {
        self.event_type == CHECKOUT_SESSION_COMPLETED || self.event_type == CHECKOUT_SESSION_ASYNC_PAYMENT_FAILED
    }
}

impl SessionObject {
    /// The local order id this session was tagged with at creation time.
    pub fn order_id(&self) -> Result<i64, StripeApiError> {
        self.metadata
            .order_id
            .as_deref()
            .ok_or_else(|| StripeApiError::MissingField("metadata.order_id".to_string()))?
            .parse::<i64>()
            .map_err(|e| StripeApiError::JsonError(format!("Invalid order id in session metadata. {e}")))
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_details.as_ref().and_then(|d| d.email.as_deref())
    }
}
