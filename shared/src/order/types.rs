//! Order record and request/response types
//!
//! JSON field names are camelCase; enum values use the wire spelling the
//! mobile app and dashboard already speak (`out-for-delivery`, `cod`, ...).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status
///
/// `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Next status on the happy path (`None` for terminal states)
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OutForDelivery => "out-for-delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status: {}", s))
    }
}

/// Payment status (independent of [`OrderStatus`])
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Upi,
    Card,
    Wallet,
}

/// Channel the order was placed through
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderSource {
    #[default]
    MobileApp,
    Web,
    Phone,
    WalkIn,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CancellationReason {
    CustomerRequest,
    OutOfStock,
    RestaurantClosed,
    DeliveryIssue,
    PaymentFailed,
    Other,
}

/// Owning customer (id + display name captured at order time)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customization {
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Line item - name and price are snapshots of the menu at order time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_item: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customization: Vec<Customization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl Pricing {
    /// subtotal + tax + deliveryFee - discount
    pub fn recomputed_total(&self) -> Decimal {
        self.subtotal + self.tax + self.delivery_fee - self.discount
    }
}

/// Free-text notes per audience
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderNotes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kitchen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderRating {
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    pub review_date: DateTime<Utc>,
}

/// Persisted order record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub order_number: String,
    pub customer: CustomerRef,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_info: DeliveryInfo,
    pub pricing: Pricing,
    pub estimated_delivery_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_delivery_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<OrderRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<CancellationReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_note: Option<String>,
    #[serde(default)]
    pub notes: OrderNotes,
    #[serde(default)]
    pub source: OrderSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.customer.id == user_id
    }

    /// Past the estimated delivery time and not yet delivered
    pub fn is_delayed(&self, now: DateTime<Utc>) -> bool {
        self.status != OrderStatus::Delivered && now > self.estimated_delivery_time
    }

    /// Counts toward revenue: paid and not cancelled
    pub fn is_paid_revenue(&self) -> bool {
        self.payment_status == PaymentStatus::Paid && self.status != OrderStatus::Cancelled
    }

    /// Still waiting on the kitchen (pending, confirmed or preparing)
    pub fn is_in_kitchen_queue(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Preparing
        )
    }

    /// Minutes from placement to delivery (`None` until delivered)
    pub fn duration_minutes(&self) -> Option<i64> {
        self.actual_delivery_time
            .map(|delivered| (delivered - self.created_at).num_minutes())
    }
}

// ========== Requests ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub menu_item: String,
    pub quantity: i64,
    #[serde(default)]
    pub customization: Vec<Customization>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub payment_method: PaymentMethod,
    pub delivery_info: DeliveryInfo,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: Option<OrderSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateOrderRequest {
    pub rating: i64,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignOrderRequest {
    pub assigned_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
}

// ========== Responses ==========

/// Result of order intake
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub estimated_delivery_time: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            order_number: order.order_number.clone(),
            status: order.status,
            total: order.pricing.total,
            estimated_delivery_time: order.estimated_delivery_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order: OrderSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateResponse {
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

/// Public tracking view - no delivery or payment details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTracking {
    pub order_number: String,
    pub status: OrderStatus,
    pub customer_name: String,
    pub estimated_delivery_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub is_delayed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderTracking {
    pub fn from_order(order: &Order, now: DateTime<Utc>) -> Self {
        Self {
            order_number: order.order_number.clone(),
            status: order.status,
            customer_name: order.customer.name.clone(),
            estimated_delivery_time: order.estimated_delivery_time,
            actual_delivery_time: order.actual_delivery_time,
            is_delayed: order.is_delayed(now),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_order(now: DateTime<Utc>) -> Order {
        Order {
            id: "o-1".to_string(),
            order_number: "CP250101001".to_string(),
            customer: CustomerRef {
                id: "u-1".to_string(),
                name: "Asha".to_string(),
            },
            items: vec![],
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: PaymentMethod::Cod,
            delivery_info: DeliveryInfo {
                name: "Asha".to_string(),
                phone: "9876543210".to_string(),
                address: "12 MG Road, Indiranagar".to_string(),
                city: None,
                state: None,
                zip_code: None,
                delivery_instructions: None,
            },
            pricing: Pricing {
                subtotal: Decimal::from(450),
                tax: Decimal::ZERO,
                delivery_fee: Decimal::from(20),
                discount: Decimal::ZERO,
                total: Decimal::from(470),
            },
            estimated_delivery_time: now + Duration::minutes(45),
            actual_delivery_time: None,
            preparation_started_at: None,
            assigned_to: None,
            rating: None,
            cancellation_reason: None,
            cancellation_note: None,
            notes: OrderNotes::default(),
            source: OrderSource::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::OutForDelivery).unwrap(),
            "\"out-for-delivery\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
        assert!(serde_json::from_str::<OrderStatus>("\"shipped\"").is_err());
        assert_eq!("ready".parse::<OrderStatus>().unwrap(), OrderStatus::Ready);
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![OrderStatus::Delivered, OrderStatus::Cancelled]);
        assert_eq!(OrderStatus::Delivered.next(), None);
        assert_eq!(
            OrderStatus::Ready.next(),
            Some(OrderStatus::OutForDelivery)
        );
    }

    #[test]
    fn test_order_serializes_mongo_style_id() {
        let now = Utc::now();
        let json = serde_json::to_value(sample_order(now)).unwrap();
        assert_eq!(json["_id"], "o-1");
        assert_eq!(json["orderNumber"], "CP250101001");
        assert_eq!(json["paymentMethod"], "cod");
        assert_eq!(json["source"], "mobile-app");
        assert_eq!(json["pricing"]["deliveryFee"], 20.0);
        assert!(json.get("rating").is_none());
    }

    #[test]
    fn test_delay_and_duration() {
        let now = Utc::now();
        let mut order = sample_order(now);
        assert!(!order.is_delayed(now));
        assert!(order.is_delayed(now + Duration::minutes(46)));
        assert_eq!(order.duration_minutes(), None);

        order.status = OrderStatus::Delivered;
        order.actual_delivery_time = Some(now + Duration::minutes(50));
        assert!(!order.is_delayed(now + Duration::minutes(60)));
        assert_eq!(order.duration_minutes(), Some(50));
    }

    #[test]
    fn test_revenue_and_queue_flags() {
        let mut order = sample_order(Utc::now());
        assert!(order.is_in_kitchen_queue());
        assert!(!order.is_paid_revenue());

        order.payment_status = PaymentStatus::Paid;
        order.status = OrderStatus::Ready;
        assert!(order.is_paid_revenue());
        assert!(!order.is_in_kitchen_queue());

        order.status = OrderStatus::Cancelled;
        assert!(!order.is_paid_revenue());
    }

    #[test]
    fn test_pagination_pages() {
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).pages, 1);
        assert_eq!(Pagination::new(2, 10, 11).pages, 2);
    }

    #[test]
    fn test_pricing_recomputed_total() {
        let pricing = Pricing {
            subtotal: Decimal::from(600),
            tax: Decimal::from(30),
            delivery_fee: Decimal::ZERO,
            discount: Decimal::from(50),
            total: Decimal::from(580),
        };
        assert_eq!(pricing.recomputed_total(), pricing.total);
    }
}
