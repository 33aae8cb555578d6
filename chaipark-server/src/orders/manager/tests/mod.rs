use super::*;
use crate::notify::NotifyError;
use crate::orders::storage::StorageResult;
use crate::realtime::PublishError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{MenuCategory, MenuItem};
use shared::order::{OrderItemInput, PaymentMethod};
use std::sync::Mutex;

// ========================================================================
// Recording / failing collaborators
// ========================================================================

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, OrderStatus)>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(String, OrderStatus)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn notify_status(&self, order: &Order, status: OrderStatus) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((order.order_number.clone(), status));
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl NotificationDispatcher for FailingNotifier {
    async fn notify_status(&self, _order: &Order, _status: OrderStatus) -> Result<(), NotifyError> {
        Err(NotifyError::DeliveryFailed("push gateway down".to_string()))
    }
}

/// Dispatcher that never answers
struct HangingNotifier;

#[async_trait]
impl NotificationDispatcher for HangingNotifier {
    async fn notify_status(&self, _order: &Order, _status: OrderStatus) -> Result<(), NotifyError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<OrderLifecycleEvent>>,
}

impl RecordingPublisher {
    fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }

    fn events(&self) -> Vec<OrderLifecycleEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl OrderEventPublisher for RecordingPublisher {
    fn publish(&self, event: OrderLifecycleEvent) -> Result<(), PublishError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

struct FailingPublisher;

impl OrderEventPublisher for FailingPublisher {
    fn publish(&self, _event: OrderLifecycleEvent) -> Result<(), PublishError> {
        Err(PublishError::Failed("socket layer gone".to_string()))
    }
}

/// Catalog whose popularity update always fails
struct PopularityFailingCatalog {
    inner: OrderStorage,
}

impl MenuCatalog for PopularityFailingCatalog {
    fn find_menu_items(&self, ids: &[String]) -> StorageResult<Vec<MenuItem>> {
        self.inner.find_menu_items(ids)
    }

    fn increment_popularity(&self, _increments: &[(String, u32)]) -> StorageResult<()> {
        Err(StorageError::Unavailable("catalog write refused".to_string()))
    }

    fn get_menu_item(&self, id: &str) -> StorageResult<Option<MenuItem>> {
        self.inner.get_menu_item(id)
    }

    fn list_menu_items(
        &self,
        category: Option<MenuCategory>,
        available_only: bool,
    ) -> StorageResult<Vec<MenuItem>> {
        self.inner.list_menu_items(category, available_only)
    }

    fn insert_menu_item(&self, item: &MenuItem) -> StorageResult<()> {
        self.inner.insert_menu_item(item)
    }

    fn set_availability(
        &self,
        id: &str,
        is_available: bool,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<MenuItem>> {
        self.inner.set_availability(id, is_available, now)
    }
}

/// Sequence that always hands out the same number
struct StuckSequence;

impl OrderSequence for StuckSequence {
    fn next_daily_sequence(&self, _day_key: &str) -> StorageResult<u64> {
        Ok(1)
    }
}

// ========================================================================
// Fixtures
// ========================================================================

struct Harness {
    manager: OrdersManager,
    storage: OrderStorage,
    notifier: Arc<RecordingNotifier>,
    publisher: Arc<RecordingPublisher>,
}

fn create_harness_with(settings: OrderSettings) -> Harness {
    let storage = OrderStorage::open_in_memory().unwrap();
    seed_menu(&storage);
    let notifier = Arc::new(RecordingNotifier::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let manager = OrdersManager::new(
        storage.clone(),
        notifier.clone(),
        publisher.clone(),
        settings,
    );
    Harness {
        manager,
        storage,
        notifier,
        publisher,
    }
}

fn create_harness() -> Harness {
    create_harness_with(OrderSettings::default())
}

fn create_test_manager() -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    seed_menu(&storage);
    OrdersManager::with_storage(storage)
}

fn menu_item(id: &str, name: &str, price: i64, is_available: bool) -> MenuItem {
    let now = Utc::now();
    MenuItem {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        price: Decimal::from(price),
        category: MenuCategory::Tea,
        is_available,
        is_vegetarian: true,
        preparation_time: 5,
        popularity: 0,
        created_at: now,
        updated_at: now,
    }
}

/// chai 150, samosa 40, cake 300, lassi 100, thali 250, sold-out 90 (unavailable)
fn seed_menu(storage: &OrderStorage) {
    for item in [
        menu_item("chai", "Masala Chai", 150, true),
        menu_item("samosa", "Samosa", 40, true),
        menu_item("cake", "Chocolate Cake", 300, true),
        menu_item("lassi", "Sweet Lassi", 100, true),
        menu_item("thali", "Veg Thali", 250, true),
        menu_item("sold-out", "Kulhad Chai", 90, false),
    ] {
        storage.insert_menu_item(&item).unwrap();
    }
}

fn customer() -> Actor {
    Actor::new("user-1", "Asha", UserRole::User)
}

fn other_customer() -> Actor {
    Actor::new("user-2", "Vikram", UserRole::User)
}

fn staff() -> Actor {
    Actor::new("staff-1", "Kitchen", UserRole::Staff)
}

fn admin() -> Actor {
    Actor::new("admin-1", "Owner", UserRole::Admin)
}

fn line(menu_item: &str, quantity: i64) -> OrderItemInput {
    OrderItemInput {
        menu_item: menu_item.to_string(),
        quantity,
        customization: vec![],
        special_instructions: None,
    }
}

fn delivery_info() -> DeliveryInfo {
    DeliveryInfo {
        name: "Asha".to_string(),
        phone: "9876543210".to_string(),
        address: "12 MG Road, Indiranagar".to_string(),
        city: Some("Bengaluru".to_string()),
        state: None,
        zip_code: None,
        delivery_instructions: None,
    }
}

fn create_request(items: Vec<OrderItemInput>) -> CreateOrderRequest {
    CreateOrderRequest {
        items,
        payment_method: PaymentMethod::Cod,
        delivery_info: delivery_info(),
        notes: None,
        source: None,
    }
}

async fn place_order(manager: &OrdersManager, actor: &Actor) -> Order {
    manager
        .create_order(actor, create_request(vec![line("chai", 3)]))
        .await
        .unwrap()
}

fn status(to: OrderStatus) -> UpdateStatusRequest {
    UpdateStatusRequest {
        status: to,
        notes: None,
    }
}

async fn deliver(manager: &OrdersManager, order_id: &str) -> Order {
    manager
        .update_status(&staff(), order_id, status(OrderStatus::Delivered))
        .await
        .unwrap()
}

mod test_flows;
