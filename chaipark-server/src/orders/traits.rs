//! Collaborator seams for the order lifecycle
//!
//! [`OrdersManager`](super::OrdersManager) never touches redb directly; it
//! talks to these traits so tests can swap in failing or recording fakes.
//! [`OrderStorage`](super::OrderStorage) implements all three store traits.

use chrono::{DateTime, Utc};
use shared::models::{MenuCategory, MenuItem};
use shared::order::{Order, OrderStatus};

use super::storage::StorageResult;

/// Order persistence
pub trait OrderStore: Send + Sync {
    /// Insert a new order; fails with `DuplicateOrderNumber` if the number is taken
    fn insert_order(&self, order: &Order) -> StorageResult<()>;

    fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>>;

    fn find_by_number(&self, order_number: &str) -> StorageResult<Option<Order>>;

    /// Overwrite an existing order (last write wins)
    fn save_order(&self, order: &Order) -> StorageResult<()>;

    /// Page of matching orders (newest first) and the total match count
    fn list_orders(&self, filter: &OrderFilter) -> StorageResult<(Vec<Order>, u64)>;
}

/// Menu catalog
pub trait MenuCatalog: Send + Sync {
    /// Batch lookup by id. Unknown ids are skipped and repeated ids resolve once.
    fn find_menu_items(&self, ids: &[String]) -> StorageResult<Vec<MenuItem>>;

    /// Add `(menu_item_id, quantity)` to each item's popularity atomically
    fn increment_popularity(&self, increments: &[(String, u32)]) -> StorageResult<()>;

    fn get_menu_item(&self, id: &str) -> StorageResult<Option<MenuItem>>;

    /// Sorted by popularity desc, then name
    fn list_menu_items(
        &self,
        category: Option<MenuCategory>,
        available_only: bool,
    ) -> StorageResult<Vec<MenuItem>>;

    fn insert_menu_item(&self, item: &MenuItem) -> StorageResult<()>;

    /// Returns the updated item, `None` if it doesn't exist
    fn set_availability(
        &self,
        id: &str,
        is_available: bool,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<MenuItem>>;
}

/// Atomic per-day counter backing order numbers
pub trait OrderSequence: Send + Sync {
    /// Increment and return the counter for `day_key` (YYMMDD). Starts at 1.
    fn next_daily_sequence(&self, day_key: &str) -> StorageResult<u64>;
}

/// Order list filter
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub customer_id: Option<String>,
    pub status: Option<OrderStatus>,
    /// Inclusive lower bound on `createdAt`
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `createdAt`
    pub created_to: Option<DateTime<Utc>>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            customer_id: None,
            status: None,
            created_from: None,
            created_to: None,
            offset: 0,
            limit: usize::MAX,
        }
    }
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(customer_id) = &self.customer_id
            && !order.is_owned_by(customer_id)
        {
            return false;
        }
        if self.status.is_some_and(|s| s != order.status) {
            return false;
        }
        if self.created_from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| order.created_at >= to) {
            return false;
        }
        true
    }
}
