use std::fmt::Display;

use chrono::{DateTime, Utc};
use scs_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{NewOrderItem, Order, OrderItemLine, OrderStatus};

/// An order together with its item lines and derived total. The total is the sum of line costs at current catalog
/// prices, never a stored value.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItemLine>,
    pub total_cost: Money,
}

impl OrderWithItems {
    pub fn new(order: Order, items: Vec<OrderItemLine>) -> Self {
        let total_cost = items.iter().map(|i| i.cost).sum();
        Self { order, items, total_cost }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<i64>,
    pub status: Option<Vec<OrderStatus>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_buyer_id(mut self, buyer_id: i64) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(buyer_id) = &self.buyer_id {
            write!(f, "buyer_id: {buyer_id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

/// A mutation request for an open order. Items, when present, replace existing lines positionally. Address ids,
/// when present, are set on the order. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderUpdate {
    pub items: Option<Vec<NewOrderItem>>,
    pub shipping_address_id: Option<i64>,
    pub billing_address_id: Option<i64>,
}

impl OrderUpdate {
    pub fn with_items(mut self, items: Vec<NewOrderItem>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_shipping_address(mut self, address_id: i64) -> Self {
        self.shipping_address_id = Some(address_id);
        self
    }

    pub fn with_billing_address(mut self, address_id: i64) -> Self {
        self.billing_address_id = Some(address_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_none() && self.shipping_address_id.is_none() && self.billing_address_id.is_none()
    }
}
