//! redb-based storage layer for orders and the menu catalog
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` (JSON) | Order records |
//! | `order_numbers` | `order_number` | `order_id` | Unique order number index |
//! | `menu_items` | `menu_item_id` | `MenuItem` (JSON) | Menu catalog |
//! | `sequence_counter` | `order_seq:<YYMMDD>` | `u64` | Daily order number counter |
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns. Write
//! transactions are serialized, which is what makes the daily counter and
//! the popularity increments atomic without extra locking.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use shared::models::{MenuCategory, MenuItem};
use shared::order::Order;
use thiserror::Error;

use super::traits::{MenuCatalog, OrderFilter, OrderSequence, OrderStore};

/// Orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Unique index: key = order_number, value = order_id
const ORDER_NUMBERS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_numbers");

/// Menu catalog: key = menu item id, value = JSON-serialized MenuItem
const MENU_ITEMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("menu_items");

/// Counters: key = "order_seq:<YYMMDD>", value = last issued sequence
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const ORDER_SEQ_PREFIX: &str = "order_seq:";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate order number: {0}")]
    DuplicateOrderNumber(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Menu item already exists: {0}")]
    DuplicateMenuItem(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for OrderStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStorage").finish_non_exhaustive()
    }
}

impl OrderStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and throwaway instances)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create all tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(MENU_ITEMS_TABLE)?;
            let _ = write_txn.open_table(SEQUENCE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Cheap liveness check used by the health endpoint
    pub fn ping(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        Ok(table.len()?)
    }

    // ========== Daily Sequence ==========

    /// Increment and return the counter for `day_key` (YYMMDD)
    ///
    /// First call of the day returns 1.
    pub fn next_daily_sequence(&self, day_key: &str) -> StorageResult<u64> {
        let key = format!("{}{}", ORDER_SEQ_PREFIX, day_key);
        let txn = self.db.begin_write()?;
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table.get(key.as_str())?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key.as_str(), next)?;
        drop(table);
        txn.commit()?;
        Ok(next)
    }

    /// Current counter for `day_key` (without incrementing)
    #[cfg(test)]
    pub fn current_daily_sequence(&self, day_key: &str) -> StorageResult<u64> {
        let key = format!("{}{}", ORDER_SEQ_PREFIX, day_key);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table.get(key.as_str())?.map(|g| g.value()).unwrap_or(0))
    }

    // ========== Orders ==========

    /// Insert a new order, enforcing the unique order number index
    pub fn insert_order(&self, order: &Order) -> StorageResult<()> {
        let value = serde_json::to_vec(order)?;
        let txn = self.db.begin_write()?;
        {
            let mut numbers = txn.open_table(ORDER_NUMBERS_TABLE)?;
            if numbers.get(order.order_number.as_str())?.is_some() {
                // txn dropped without commit → rollback
                return Err(StorageError::DuplicateOrderNumber(order.order_number.clone()));
            }
            numbers.insert(order.order_number.as_str(), order.id.as_str())?;

            let mut orders = txn.open_table(ORDERS_TABLE)?;
            orders.insert(order.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Overwrite an existing order (last write wins)
    pub fn save_order(&self, order: &Order) -> StorageResult<()> {
        let value = serde_json::to_vec(order)?;
        let txn = self.db.begin_write()?;
        {
            let mut orders = txn.open_table(ORDERS_TABLE)?;
            if orders.get(order.id.as_str())?.is_none() {
                return Err(StorageError::OrderNotFound(order.id.clone()));
            }
            orders.insert(order.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_by_number(&self, order_number: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let numbers = read_txn.open_table(ORDER_NUMBERS_TABLE)?;
        let Some(order_id) = numbers.get(order_number)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        let orders = read_txn.open_table(ORDERS_TABLE)?;
        match orders.get(order_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Filtered page of orders, newest first, plus the total match count
    pub fn list_orders(&self, filter: &OrderFilter) -> StorageResult<(Vec<Order>, u64)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut matched = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if filter.matches(&order) {
                matched.push(order);
            }
        }

        // 同一时刻创建的订单按订单号倒序
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_number.cmp(&a.order_number))
        });
        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect();
        Ok((page, total))
    }

    #[cfg(test)]
    pub fn order_count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        Ok(table.len()?)
    }

    // ========== Menu Items ==========

    pub fn insert_menu_item(&self, item: &MenuItem) -> StorageResult<()> {
        let value = serde_json::to_vec(item)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(MENU_ITEMS_TABLE)?;
            if table.get(item.id.as_str())?.is_some() {
                return Err(StorageError::DuplicateMenuItem(item.id.clone()));
            }
            table.insert(item.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_menu_item(&self, id: &str) -> StorageResult<Option<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_ITEMS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Batch lookup; unknown ids are skipped, duplicates resolve once
    pub fn find_menu_items(&self, ids: &[String]) -> StorageResult<Vec<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_ITEMS_TABLE)?;

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if let Some(value) = table.get(id.as_str())? {
                items.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(items)
    }

    /// Add ordered quantities to popularity in a single write transaction
    pub fn increment_popularity(&self, increments: &[(String, u32)]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(MENU_ITEMS_TABLE)?;
            for (id, quantity) in increments {
                let existing = table.get(id.as_str())?.map(|g| g.value().to_vec());
                let Some(bytes) = existing else {
                    tracing::warn!(menu_item_id = %id, "Popularity increment for unknown menu item");
                    continue;
                };
                let mut item: MenuItem = serde_json::from_slice(&bytes)?;
                item.popularity += u64::from(*quantity);
                let value = serde_json::to_vec(&item)?;
                table.insert(id.as_str(), value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// Menu listing sorted by popularity desc, then name
    pub fn list_menu_items(
        &self,
        category: Option<MenuCategory>,
        available_only: bool,
    ) -> StorageResult<Vec<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_ITEMS_TABLE)?;

        let mut items = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let item: MenuItem = serde_json::from_slice(value.value())?;
            if available_only && !item.is_available {
                continue;
            }
            if category.is_some_and(|c| c != item.category) {
                continue;
            }
            items.push(item);
        }

        items.sort_by(|a, b| {
            b.popularity
                .cmp(&a.popularity)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(items)
    }

    pub fn set_availability(
        &self,
        id: &str,
        is_available: bool,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<MenuItem>> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(MENU_ITEMS_TABLE)?;
            let existing = table.get(id)?.map(|g| g.value().to_vec());
            match existing {
                Some(bytes) => {
                    let mut item: MenuItem = serde_json::from_slice(&bytes)?;
                    item.is_available = is_available;
                    item.updated_at = now;
                    let value = serde_json::to_vec(&item)?;
                    table.insert(id, value.as_slice())?;
                    Some(item)
                }
                None => None,
            }
        };
        txn.commit()?;
        Ok(updated)
    }
}

// ========== Trait implementations ==========

impl OrderStore for OrderStorage {
    fn insert_order(&self, order: &Order) -> StorageResult<()> {
        OrderStorage::insert_order(self, order)
    }

    fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        OrderStorage::get_order(self, order_id)
    }

    fn find_by_number(&self, order_number: &str) -> StorageResult<Option<Order>> {
        OrderStorage::find_by_number(self, order_number)
    }

    fn save_order(&self, order: &Order) -> StorageResult<()> {
        OrderStorage::save_order(self, order)
    }

    fn list_orders(&self, filter: &OrderFilter) -> StorageResult<(Vec<Order>, u64)> {
        OrderStorage::list_orders(self, filter)
    }
}

impl MenuCatalog for OrderStorage {
    fn find_menu_items(&self, ids: &[String]) -> StorageResult<Vec<MenuItem>> {
        OrderStorage::find_menu_items(self, ids)
    }

    fn increment_popularity(&self, increments: &[(String, u32)]) -> StorageResult<()> {
        OrderStorage::increment_popularity(self, increments)
    }

    fn get_menu_item(&self, id: &str) -> StorageResult<Option<MenuItem>> {
        OrderStorage::get_menu_item(self, id)
    }

    fn list_menu_items(
        &self,
        category: Option<MenuCategory>,
        available_only: bool,
    ) -> StorageResult<Vec<MenuItem>> {
        OrderStorage::list_menu_items(self, category, available_only)
    }

    fn insert_menu_item(&self, item: &MenuItem) -> StorageResult<()> {
        OrderStorage::insert_menu_item(self, item)
    }

    fn set_availability(
        &self,
        id: &str,
        is_available: bool,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<MenuItem>> {
        OrderStorage::set_availability(self, id, is_available, now)
    }
}

impl OrderSequence for OrderStorage {
    fn next_daily_sequence(&self, day_key: &str) -> StorageResult<u64> {
        OrderStorage::next_daily_sequence(self, day_key)
    }
}
