use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use scs_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        Role        ----------------------------------------------------------

/// Access roles carried in authentication claims. `User` actors may only touch their own orders; `Admin` actors may
/// read and mutate any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

pub type Roles = Vec<Role>;

//--------------------------------------      OrderId       ----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self).map_err(|_| ConversionError(format!("Invalid order id: {s}")))
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------    OrderStatus     ----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order is open. Items and addresses may still change.
    Pending,
    /// The order has been paid in full. It is immutable from here on.
    Completed,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------   PaymentStatus    ----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// No terminal gateway event has been reconciled against this payment yet.
    Pending,
    /// The gateway reported a successful checkout for this payment.
    Completed,
    /// The gateway reported that payment failed. The order stays open.
    Failed,
}

impl PaymentStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------   PaymentOption    ----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentOption {
    Paypal,
    Stripe,
}

impl Display for PaymentOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentOption::Paypal => write!(f, "Paypal"),
            PaymentOption::Stripe => write!(f, "Stripe"),
        }
    }
}

impl FromStr for PaymentOption {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Paypal" => Ok(Self::Paypal),
            "Stripe" => Ok(Self::Stripe),
            s => Err(ConversionError(format!("Invalid payment option: {s}"))),
        }
    }
}

//--------------------------------------       Order        ----------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// External user reference. Buyers are managed by the identity collaborator, not this subsystem.
    pub buyer_id: i64,
    pub status: OrderStatus,
    pub shipping_address_id: Option<i64>,
    pub billing_address_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder      ----------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub buyer_id: i64,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn new(buyer_id: i64, items: Vec<NewOrderItem>) -> Self {
        Self { buyer_id, items }
    }
}

//--------------------------------------     OrderItem      ----------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
}

impl NewOrderItem {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

//--------------------------------------   OrderItemLine    ----------------------------------------------------------

/// An order item joined with its product. `price` is the product's price *right now* and `cost` is
/// `quantity × price`, both computed at read time. Totals of open orders therefore follow catalog price changes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItemLine {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: i64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub quantity: i64,
    pub price: Money,
    pub cost: Money,
}

//--------------------------------------      Payment       ----------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    /// Each order has at most one payment.
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub payment_option: PaymentOption,
    /// The gateway event id that drove this payment to a terminal status. Doubles as the dedup key that lets webhook
    /// redeliveries be recognised as replays.
    pub event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub payment_option: PaymentOption,
}

impl NewPayment {
    pub fn new(order_id: OrderId, payment_option: PaymentOption) -> Self {
        Self { order_id, payment_option }
    }
}

//--------------------------------------      Product       ----------------------------------------------------------

/// Catalog products are read-only collaborators here. This subsystem checks stock when items are added and reads
/// prices when totals are computed, but it never mutates a product. In particular, stock is *not* decremented when an
/// order completes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    pub description: String,
    /// Path of the product image, relative to the public backend URL.
    pub image: String,
    pub price: Money,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub seller_id: i64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: Money,
    pub quantity: i64,
}

//--------------------------------------      Address       ----------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub buyer_id: i64,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    pub buyer_id: i64,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}
