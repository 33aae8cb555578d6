//! OrdersManager - order lifecycle operations
//!
//! This module handles:
//! - Order intake (validation, menu lookup, pricing, order number)
//! - Status transitions with status-dependent notes and timestamps
//! - Customer cancel and rating
//! - Admin queries, assignment and payment status
//! - Staff dashboard and revenue reports
//! - Side effects (customer notification, real-time events)
//!
//! # Intake Flow
//!
//! ```text
//! create_order(actor, req)
//!     ├─ 1. Validate request (items, quantities, delivery info)
//!     ├─ 2. Batch lookup menu items (found + available == requested)
//!     ├─ 3. Snapshot lines and price them
//!     ├─ 4. Next daily sequence → CP<YYMMDD><NNN>
//!     ├─ 5. Insert (unique order number index)
//!     ├─ 6. Popularity increments   (best-effort)
//!     └─ 7. Publish `new-order`      (best-effort)
//! ```
//!
//! Side effects run after the write commits. Their failures are logged at
//! `warn` and never change the result of the operation. Customer
//! notification is bounded by `notify_timeout_ms`.

mod error;
mod reports;
pub use error::*;
pub use reports::MAX_REPORT_DAYS;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use shared::models::UserRole;
use shared::order::{
    CancelOrderRequest, CancellationReason, CreateOrderRequest, CustomerRef, DeliveryInfo, Order,
    OrderLifecycleEvent, OrderList, OrderNotes, OrderRating, OrderSource, OrderStatus,
    OrderTracking, Pagination, PaymentStatus, RateOrderRequest, UpdateStatusRequest,
};

use super::number::{day_key, format_order_number, is_valid_order_number};
use super::pricing::{MAX_QUANTITY, PricingRules, price_items, snapshot_line};
use super::storage::{OrderStorage, StorageError};
use super::traits::{MenuCatalog, OrderFilter, OrderSequence, OrderStore};
use super::transition::TransitionPolicy;
use crate::notify::{NotificationDispatcher, TracingNotifier};
use crate::realtime::{OrderEventBus, OrderEventPublisher};
use crate::utils::time::day_range_utc;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NOTE_LEN, MIN_ADDRESS_LEN, MIN_NAME_LEN, is_valid_phone, trimmed_len,
};

/// Customer order list: default / max page size
pub const CUSTOMER_DEFAULT_LIMIT: u32 = 10;
pub const CUSTOMER_MAX_LIMIT: u32 = 50;

/// Admin order list: default / max page size
pub const ADMIN_DEFAULT_LIMIT: u32 = 20;
pub const ADMIN_MAX_LIMIT: u32 = 100;

const MIN_RATING: i64 = 1;
const MAX_RATING: i64 = 5;

/// Business settings applied by the manager
#[derive(Debug, Clone)]
pub struct OrderSettings {
    pub pricing: PricingRules,
    pub estimated_delivery_minutes: i64,
    /// 业务时区 (订单号日期、按日过滤)
    pub timezone: Tz,
    pub transition_policy: TransitionPolicy,
    /// 单次客户通知的等待上限 (毫秒)，超时后放弃
    pub notify_timeout_ms: u64,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            pricing: PricingRules::default(),
            estimated_delivery_minutes: 45,
            timezone: chrono_tz::Asia::Kolkata,
            transition_policy: TransitionPolicy::default(),
            notify_timeout_ms: 5000,
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub name: String,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            role,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// OrdersManager for the order lifecycle
pub struct OrdersManager {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn MenuCatalog>,
    sequence: Arc<dyn OrderSequence>,
    notifier: Arc<dyn NotificationDispatcher>,
    publisher: Arc<dyn OrderEventPublisher>,
    settings: OrderSettings,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("orders", &"<dyn OrderStore>")
            .field("catalog", &"<dyn MenuCatalog>")
            .field("settings", &self.settings)
            .finish()
    }
}

impl OrdersManager {
    /// Create a manager backed by a single redb storage
    pub fn new(
        storage: OrderStorage,
        notifier: Arc<dyn NotificationDispatcher>,
        publisher: Arc<dyn OrderEventPublisher>,
        settings: OrderSettings,
    ) -> Self {
        let storage = Arc::new(storage);
        Self::with_collaborators(
            storage.clone(),
            storage.clone(),
            storage,
            notifier,
            publisher,
            settings,
        )
    }

    /// Create a manager with explicit collaborators
    pub fn with_collaborators(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn MenuCatalog>,
        sequence: Arc<dyn OrderSequence>,
        notifier: Arc<dyn NotificationDispatcher>,
        publisher: Arc<dyn OrderEventPublisher>,
        settings: OrderSettings,
    ) -> Self {
        Self {
            orders,
            catalog,
            sequence,
            notifier,
            publisher,
            settings,
        }
    }

    /// Create an OrdersManager with existing storage and default side effects
    pub fn with_storage(storage: OrderStorage) -> Self {
        Self::new(
            storage,
            Arc::new(TracingNotifier),
            Arc::new(OrderEventBus::new(64)),
            OrderSettings::default(),
        )
    }

    pub fn settings(&self) -> &OrderSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &Arc<dyn MenuCatalog> {
        &self.catalog
    }

    // ========== Intake ==========

    /// Validate, price, number and persist a new order
    pub async fn create_order(&self, actor: &Actor, req: CreateOrderRequest) -> ManagerResult<Order> {
        let quantities = validate_create_request(&req)?;

        // 1. Batch lookup (ids deduplicated by the catalog)
        let ids: Vec<String> = req.items.iter().map(|i| i.menu_item.clone()).collect();
        let found = self.catalog.find_menu_items(&ids)?;
        let available: HashMap<&str, _> = found
            .iter()
            .filter(|item| item.is_available)
            .map(|item| (item.id.as_str(), item))
            .collect();
        if available.len() != req.items.len() {
            tracing::info!(
                requested = req.items.len(),
                available = available.len(),
                customer_id = %actor.user_id,
                "Order rejected: items unavailable"
            );
            return Err(ManagerError::ItemsUnavailable {
                requested: req.items.len(),
                available: available.len(),
            });
        }

        // 2. Snapshot + price
        let mut lines = Vec::with_capacity(req.items.len());
        for (input, quantity) in req.items.iter().zip(quantities) {
            let menu_item = available
                .get(input.menu_item.as_str())
                .ok_or_else(|| ManagerError::MenuItemNotFound(input.menu_item.clone()))?;
            lines.push(snapshot_line(input, menu_item, quantity)?);
        }
        let pricing = price_items(&lines, &self.settings.pricing)?;

        // 3. Order number from the atomic daily counter
        let now = Utc::now();
        let day = day_key(now, self.settings.timezone);
        let sequence = self.sequence.next_daily_sequence(&day)?;
        let order_number = format_order_number(&day, sequence);

        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            order_number,
            customer: CustomerRef {
                id: actor.user_id.clone(),
                name: actor.name.clone(),
            },
            items: lines,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: req.payment_method,
            delivery_info: normalize_delivery_info(req.delivery_info),
            pricing,
            estimated_delivery_time: now + Duration::minutes(self.settings.estimated_delivery_minutes),
            actual_delivery_time: None,
            preparation_started_at: None,
            assigned_to: None,
            rating: None,
            cancellation_reason: None,
            cancellation_note: None,
            notes: OrderNotes {
                customer: non_empty(req.notes),
                ..Default::default()
            },
            source: req.source.unwrap_or(OrderSource::MobileApp),
            created_at: now,
            updated_at: now,
        };

        // 4. Persist
        self.orders.insert_order(&order).map_err(|e| match e {
            StorageError::DuplicateOrderNumber(number) => {
                tracing::error!(order_number = %number, "Order number collision");
                ManagerError::OrderNumberConflict(number)
            }
            other => ManagerError::Storage(other),
        })?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            customer_id = %order.customer.id,
            total = %order.pricing.total,
            items = order.items.len(),
            "Order created"
        );

        // 5. Side effects (best-effort)
        let increments: Vec<(String, u32)> = order
            .items
            .iter()
            .map(|item| (item.menu_item.clone(), item.quantity))
            .collect();
        if let Err(e) = self.catalog.increment_popularity(&increments) {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to update menu popularity");
        }
        self.publish(OrderLifecycleEvent::new_order(&order));

        Ok(order)
    }

    // ========== Status Transitions ==========

    /// Staff status update
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: &str,
        req: UpdateStatusRequest,
    ) -> ManagerResult<Order> {
        if !actor.is_staff() {
            return Err(ManagerError::Forbidden(
                "Staff access required to update order status".to_string(),
            ));
        }
        let notes = validate_optional_note(req.notes, "notes")?;

        let mut order = self.load(order_id)?;
        let from = order.status;
        let to = req.status;
        self.settings.transition_policy.check(from, to)?;

        let now = Utc::now();
        order.status = to;
        match to {
            OrderStatus::Preparing => {
                order.preparation_started_at = Some(now);
                if notes.is_some() {
                    order.notes.kitchen = notes;
                }
            }
            OrderStatus::OutForDelivery => {
                if notes.is_some() {
                    order.notes.delivery = notes;
                }
            }
            OrderStatus::Delivered => {
                order.actual_delivery_time = Some(now);
            }
            OrderStatus::Cancelled => {
                order
                    .cancellation_reason
                    .get_or_insert(CancellationReason::Other);
            }
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Ready => {}
        }
        order.updated_at = now;
        self.orders.save_order(&order)?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            from = %from,
            to = %to,
            operator_id = %actor.user_id,
            "Order status updated"
        );

        self.notify(&order, to).await;
        self.publish(OrderLifecycleEvent::status_updated(&order));

        Ok(order)
    }

    /// Cancel by the owning customer or staff
    pub async fn cancel_order(
        &self,
        actor: &Actor,
        order_id: &str,
        req: CancelOrderRequest,
    ) -> ManagerResult<Order> {
        let note = validate_optional_note(req.reason, "reason")?;

        let mut order = self.load(order_id)?;
        if !order.is_owned_by(&actor.user_id) && !actor.is_staff() {
            return Err(ManagerError::Forbidden(
                "Not allowed to cancel this order".to_string(),
            ));
        }
        if order.is_terminal() {
            return Err(ManagerError::InvalidStateTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        let reason = if order.is_owned_by(&actor.user_id) {
            CancellationReason::CustomerRequest
        } else {
            CancellationReason::Other
        };
        let now = Utc::now();
        order.status = OrderStatus::Cancelled;
        order.cancellation_reason = Some(reason);
        order.cancellation_note = note;
        order.updated_at = now;
        self.orders.save_order(&order)?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            reason = ?reason,
            operator_id = %actor.user_id,
            "Order cancelled"
        );

        self.notify(&order, OrderStatus::Cancelled).await;
        self.publish(OrderLifecycleEvent::cancelled(&order, reason));

        Ok(order)
    }

    // ========== Rating ==========

    /// Rate a delivered order (owner only, once)
    pub async fn rate_order(
        &self,
        actor: &Actor,
        order_id: &str,
        req: RateOrderRequest,
    ) -> ManagerResult<Order> {
        // 归属检查先于输入校验
        let mut order = self.load(order_id)?;
        if !order.is_owned_by(&actor.user_id) {
            return Err(ManagerError::Forbidden(
                "Only the customer can rate this order".to_string(),
            ));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&req.rating) {
            return Err(ManagerError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        let review = validate_optional_note(req.review, "review")?;
        if order.status != OrderStatus::Delivered {
            return Err(ManagerError::NotDelivered);
        }
        if order.rating.is_some() {
            return Err(ManagerError::AlreadyRated);
        }

        let now = Utc::now();
        order.rating = Some(OrderRating {
            rating: req.rating as u8,
            review,
            review_date: now,
        });
        order.updated_at = now;
        self.orders.save_order(&order)?;

        tracing::info!(order_id = %order.id, rating = req.rating, "Order rated");
        Ok(order)
    }

    // ========== Queries ==========

    /// Order visible to the owner or staff
    pub fn get_order_for(&self, actor: &Actor, order_id: &str) -> ManagerResult<Order> {
        let order = self.load(order_id)?;
        if !order.is_owned_by(&actor.user_id) && !actor.is_staff() {
            return Err(ManagerError::Forbidden(
                "Not allowed to view this order".to_string(),
            ));
        }
        Ok(order)
    }

    /// Caller's own orders, newest first
    pub fn list_my_orders(
        &self,
        actor: &Actor,
        page: Option<u32>,
        limit: Option<u32>,
        status: Option<OrderStatus>,
    ) -> ManagerResult<OrderList> {
        let (page, limit) = resolve_page(page, limit, CUSTOMER_DEFAULT_LIMIT, CUSTOMER_MAX_LIMIT)?;
        let filter = OrderFilter {
            customer_id: Some(actor.user_id.clone()),
            status,
            offset: page_offset(page, limit),
            limit: limit as usize,
            ..Default::default()
        };
        self.list(filter, page, limit)
    }

    /// All orders (staff), optionally for one business day
    pub fn list_all(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
        status: Option<OrderStatus>,
        date: Option<NaiveDate>,
    ) -> ManagerResult<OrderList> {
        let (page, limit) = resolve_page(page, limit, ADMIN_DEFAULT_LIMIT, ADMIN_MAX_LIMIT)?;
        let (created_from, created_to) = match date {
            Some(date) => {
                let (start, end) = day_range_utc(date, self.settings.timezone);
                (Some(start), Some(end))
            }
            None => (None, None),
        };
        let filter = OrderFilter {
            customer_id: None,
            status,
            created_from,
            created_to,
            offset: page_offset(page, limit),
            limit: limit as usize,
        };
        self.list(filter, page, limit)
    }

    fn list(&self, filter: OrderFilter, page: u32, limit: u32) -> ManagerResult<OrderList> {
        let (orders, total) = self.orders.list_orders(&filter)?;
        Ok(OrderList {
            orders,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// Public tracking by order number
    pub fn track(&self, order_number: &str, now: DateTime<Utc>) -> ManagerResult<OrderTracking> {
        if !is_valid_order_number(order_number) {
            return Err(ManagerError::OrderNotFound(order_number.to_string()));
        }
        let order = self
            .orders
            .find_by_number(order_number)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_number.to_string()))?;
        Ok(OrderTracking::from_order(&order, now))
    }

    // ========== Admin ==========

    /// Any order (staff)
    pub fn get_order(&self, order_id: &str) -> ManagerResult<Order> {
        self.load(order_id)
    }

    /// Assign an order to a staff member (admin)
    pub fn assign(&self, actor: &Actor, order_id: &str, assigned_to: &str) -> ManagerResult<Order> {
        if !actor.is_admin() {
            return Err(ManagerError::Forbidden("Admin access required".to_string()));
        }
        let assigned_to = assigned_to.trim();
        if assigned_to.is_empty() {
            return Err(ManagerError::Validation(
                "assignedTo must not be empty".to_string(),
            ));
        }

        let mut order = self.load(order_id)?;
        order.assigned_to = Some(assigned_to.to_string());
        order.updated_at = Utc::now();
        self.orders.save_order(&order)?;

        tracing::info!(order_id = %order.id, assigned_to = %assigned_to, "Order assigned");
        Ok(order)
    }

    /// Update payment status (staff)
    pub fn update_payment(
        &self,
        actor: &Actor,
        order_id: &str,
        payment_status: PaymentStatus,
    ) -> ManagerResult<Order> {
        if !actor.is_staff() {
            return Err(ManagerError::Forbidden("Staff access required".to_string()));
        }

        let mut order = self.load(order_id)?;
        if order.status == OrderStatus::Cancelled && payment_status == PaymentStatus::Paid {
            return Err(ManagerError::PaymentLocked(
                "cancelled orders cannot be marked paid".to_string(),
            ));
        }
        order.payment_status = payment_status;
        order.updated_at = Utc::now();
        self.orders.save_order(&order)?;

        tracing::info!(
            order_id = %order.id,
            payment_status = ?payment_status,
            operator_id = %actor.user_id,
            "Payment status updated"
        );
        Ok(order)
    }

    // ========== Helpers ==========

    fn load(&self, order_id: &str) -> ManagerResult<Order> {
        self.orders
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    async fn notify(&self, order: &Order, status: OrderStatus) {
        let limit = std::time::Duration::from_millis(self.settings.notify_timeout_ms);
        match tokio::time::timeout(limit, self.notifier.notify_status(order, status)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(
                order_id = %order.id,
                status = %status,
                error = %e,
                "Customer notification failed"
            ),
            Err(_) => tracing::warn!(
                order_id = %order.id,
                status = %status,
                timeout_ms = self.settings.notify_timeout_ms,
                "Customer notification timed out"
            ),
        }
    }

    fn publish(&self, event: OrderLifecycleEvent) {
        let name = event.name();
        let order_id = event.order_id().to_string();
        if let Err(e) = self.publisher.publish(event) {
            tracing::warn!(event = name, order_id = %order_id, error = %e, "Order event publish failed");
        }
    }
}

// ========== Validation ==========

/// Returns each line's quantity as `u32`
fn validate_create_request(req: &CreateOrderRequest) -> ManagerResult<Vec<u32>> {
    if req.items.is_empty() {
        return Err(ManagerError::EmptyOrder);
    }

    let mut quantities = Vec::with_capacity(req.items.len());
    for (index, item) in req.items.iter().enumerate() {
        if item.menu_item.trim().is_empty() {
            return Err(ManagerError::Validation(format!(
                "items[{}].menuItem is required",
                index
            )));
        }
        let quantity = u32::try_from(item.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| {
                ManagerError::Validation(format!("items[{}]: Quantity must be at least 1", index))
            })?;
        if quantity > MAX_QUANTITY {
            return Err(ManagerError::Validation(format!(
                "items[{}]: Quantity must be at most {}",
                index, MAX_QUANTITY
            )));
        }
        quantities.push(quantity);
    }

    validate_delivery_info(&req.delivery_info)?;
    if let Some(notes) = &req.notes
        && notes.chars().count() > MAX_NOTE_LEN
    {
        return Err(ManagerError::Validation(format!(
            "notes is too long (max {} chars)",
            MAX_NOTE_LEN
        )));
    }
    Ok(quantities)
}

fn validate_delivery_info(info: &DeliveryInfo) -> ManagerResult<()> {
    if trimmed_len(&info.name) < MIN_NAME_LEN {
        return Err(ManagerError::Validation(
            "Name must be at least 2 characters".to_string(),
        ));
    }
    if !is_valid_phone(info.phone.trim()) {
        return Err(ManagerError::Validation(
            "Please provide a valid 10-digit phone number".to_string(),
        ));
    }
    let address_len = trimmed_len(&info.address);
    if address_len < MIN_ADDRESS_LEN {
        return Err(ManagerError::Validation(
            "Address must be at least 10 characters".to_string(),
        ));
    }
    if address_len > MAX_ADDRESS_LEN {
        return Err(ManagerError::Validation(format!(
            "Address is too long (max {} chars)",
            MAX_ADDRESS_LEN
        )));
    }
    Ok(())
}

fn normalize_delivery_info(info: DeliveryInfo) -> DeliveryInfo {
    DeliveryInfo {
        name: info.name.trim().to_string(),
        phone: info.phone.trim().to_string(),
        address: info.address.trim().to_string(),
        city: non_empty(info.city),
        state: non_empty(info.state),
        zip_code: non_empty(info.zip_code),
        delivery_instructions: non_empty(info.delivery_instructions),
    }
}

/// Trim, drop empty, enforce the note length limit
fn validate_optional_note(value: Option<String>, field: &str) -> ManagerResult<Option<String>> {
    let value = non_empty(value);
    if let Some(v) = &value
        && v.chars().count() > MAX_NOTE_LEN
    {
        return Err(ManagerError::Validation(format!(
            "{} is too long (max {} chars)",
            field, MAX_NOTE_LEN
        )));
    }
    Ok(value)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Apply defaults and reject out-of-range paging
fn resolve_page(
    page: Option<u32>,
    limit: Option<u32>,
    default_limit: u32,
    max_limit: u32,
) -> ManagerResult<(u32, u32)> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(default_limit);
    if page < 1 {
        return Err(ManagerError::Validation(
            "Page must be a positive integer".to_string(),
        ));
    }
    if !(1..=max_limit).contains(&limit) {
        return Err(ManagerError::Validation(format!(
            "Limit must be between 1 and {}",
            max_limit
        )));
    }
    Ok((page, limit))
}

fn page_offset(page: u32, limit: u32) -> usize {
    (page as usize - 1) * limit as usize
}

#[cfg(test)]
mod tests;
