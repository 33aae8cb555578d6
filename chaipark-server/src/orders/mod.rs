//! Order Lifecycle Module
//!
//! - **manager**: OrdersManager for intake, status changes, cancel, rating and admin queries
//! - **storage**: redb-based persistence for orders, the order number index and the menu
//! - **pricing**: line snapshots, subtotal, delivery fee
//! - **number**: `CP<YYMMDD><NNN>` order numbers
//! - **transition**: status transition policy
//!
//! # Data Flow
//!
//! ```text
//! HTTP handler → OrdersManager → Storage (redb)
//!                      ↓
//!        NotificationDispatcher / OrderEventBus → socket.io rooms
//! ```
//!
//! 1. Handler builds an [`manager::Actor`] from the access token
//! 2. OrdersManager validates and applies the operation
//! 3. The order is written in a single redb transaction
//! 4. Customer notification and real-time event are sent (best-effort)

pub mod manager;
pub mod number;
pub mod pricing;
pub mod storage;
pub mod traits;
pub mod transition;

// Re-exports
pub use manager::{Actor, ManagerError, ManagerResult, OrderSettings, OrdersManager};
pub use number::{day_key, format_order_number, is_valid_order_number};
pub use pricing::{MAX_PRICE, MAX_QUANTITY, PricingError, PricingRules};
pub use storage::{OrderStorage, StorageError, StorageResult};
pub use traits::{MenuCatalog, OrderFilter, OrderSequence, OrderStore};
pub use transition::TransitionPolicy;

// Re-export shared types for convenience
pub use shared::order::{Order, OrderLifecycleEvent, OrderStatus};
