//! Order lifecycle events pushed to real-time listeners
//!
//! Each variant maps to one socket event name; the payload is what admin
//! dashboards (and the owning customer) receive.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{CancellationReason, CustomerRef, Order, OrderStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderPayload {
    pub order_id: String,
    pub order_number: String,
    pub customer: CustomerRef,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdatedPayload {
    pub order_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub customer: CustomerRef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancelledPayload {
    pub order_id: String,
    pub order_number: String,
    pub customer: CustomerRef,
    pub reason: CancellationReason,
}

/// Order lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OrderLifecycleEvent {
    NewOrder(NewOrderPayload),
    #[serde(rename = "order-status-updated")]
    StatusUpdated(StatusUpdatedPayload),
    #[serde(rename = "order-cancelled")]
    Cancelled(OrderCancelledPayload),
}

impl OrderLifecycleEvent {
    pub fn new_order(order: &Order) -> Self {
        Self::NewOrder(NewOrderPayload {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            customer: order.customer.clone(),
            total: order.pricing.total,
            status: order.status,
        })
    }

    pub fn status_updated(order: &Order) -> Self {
        Self::StatusUpdated(StatusUpdatedPayload {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            status: order.status,
            customer: order.customer.clone(),
        })
    }

    pub fn cancelled(order: &Order, reason: CancellationReason) -> Self {
        Self::Cancelled(OrderCancelledPayload {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            customer: order.customer.clone(),
            reason,
        })
    }

    /// Socket event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewOrder(_) => "new-order",
            Self::StatusUpdated(_) => "order-status-updated",
            Self::Cancelled(_) => "order-cancelled",
        }
    }

    pub fn order_id(&self) -> &str {
        match self {
            Self::NewOrder(p) => &p.order_id,
            Self::StatusUpdated(p) => &p.order_id,
            Self::Cancelled(p) => &p.order_id,
        }
    }

    pub fn customer(&self) -> &CustomerRef {
        match self {
            Self::NewOrder(p) => &p.customer,
            Self::StatusUpdated(p) => &p.customer,
            Self::Cancelled(p) => &p.customer,
        }
    }

    /// Whether the owning customer should also receive this event
    pub fn notifies_customer(&self) -> bool {
        !matches!(self, Self::NewOrder(_))
    }

    /// Payload without the event envelope
    pub fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::NewOrder(p) => serde_json::to_value(p),
            Self::StatusUpdated(p) => serde_json::to_value(p),
            Self::Cancelled(p) => serde_json::to_value(p),
        }
    }
}
