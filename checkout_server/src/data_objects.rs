use std::fmt::Display;

use checkout_engine::db_types::{NewOrderItem, PaymentOption};
use serde::{Deserialize, Serialize};

/// Request body for `POST /api/orders`. The buyer id comes from the access token, never from the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub items: Vec<NewOrderItem>,
}

/// Request body for `POST /api/orders/{order_id}/payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentRequest {
    pub payment_option: PaymentOption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
