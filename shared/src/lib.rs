//! Shared types for ChaiPark
//!
//! Common types used by the order server and its clients: error codes and
//! response envelope, order records and lifecycle events, menu models.

pub mod error;
pub mod models;
pub mod order;

// Re-exports
pub use axum::{Json, body};
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
