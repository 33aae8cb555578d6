//! Data models
//!
//! Shared between the server and its clients (via API).

pub mod menu_item;
pub mod user;

// Re-exports
pub use menu_item::*;
pub use user::*;
