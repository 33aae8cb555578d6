use shared::error::{AppError, ErrorCode};
use shared::order::OrderStatus;
use thiserror::Error;

use super::super::pricing::PricingError;
use super::super::storage::StorageError;
use super::super::transition::TransitionRejected;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Validation(String),

    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Some items are unavailable ({available} of {requested} found)")]
    ItemsUnavailable { requested: usize, available: usize },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidStateTransition { from: OrderStatus, to: OrderStatus },

    #[error("Only delivered orders can be rated")]
    NotDelivered,

    #[error("Order has already been rated")]
    AlreadyRated,

    #[error("Payment status cannot change: {0}")]
    PaymentLocked(String),

    #[error("Order number already issued: {0}")]
    OrderNumberConflict(String),
}

impl From<PricingError> for ManagerError {
    fn from(e: PricingError) -> Self {
        ManagerError::Validation(e.to_string())
    }
}

impl From<TransitionRejected> for ManagerError {
    fn from(rejected: TransitionRejected) -> Self {
        ManagerError::InvalidStateTransition {
            from: rejected.from,
            to: rejected.to,
        }
    }
}

/// 将存储错误转换为错误码
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    // 先按枚举变体精确匹配
    match e {
        StorageError::Serialization(_) => return ErrorCode::InternalError,
        StorageError::OrderNotFound(_) => return ErrorCode::OrderNotFound,
        StorageError::DuplicateOrderNumber(_) => return ErrorCode::OrderNumberConflict,
        StorageError::DuplicateMenuItem(_) => return ErrorCode::AlreadyExists,
        StorageError::Unavailable(_) => return ErrorCode::SystemBusy,
        _ => {}
    }

    // redb 错误通过字符串匹配分类
    let err_str = e.to_string().to_lowercase();

    // 磁盘空间不足
    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return ErrorCode::StorageFull;
    }

    // 内存不足
    if err_str.contains("out of memory") || err_str.contains("cannot allocate") {
        return ErrorCode::OutOfMemory;
    }

    // 数据损坏
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    ErrorCode::DatabaseError
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        let message = err.to_string();
        match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                AppError::with_message(code, message)
            }
            ManagerError::Validation(_) => AppError::validation(message),
            ManagerError::EmptyOrder => AppError::with_message(ErrorCode::OrderEmpty, message),
            ManagerError::ItemsUnavailable {
                requested,
                available,
            } => AppError::with_message(ErrorCode::OrderItemsUnavailable, message)
                .with_detail("requested", requested)
                .with_detail("available", available),
            ManagerError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
            ManagerError::MenuItemNotFound(_) => {
                AppError::with_message(ErrorCode::MenuItemNotFound, message)
            }
            ManagerError::Forbidden(_) => AppError::forbidden(message),
            ManagerError::InvalidStateTransition { from, to } => {
                AppError::with_message(ErrorCode::OrderInvalidStateTransition, message)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            ManagerError::NotDelivered => {
                AppError::with_message(ErrorCode::OrderNotDelivered, message)
            }
            ManagerError::AlreadyRated => {
                AppError::with_message(ErrorCode::OrderAlreadyRated, message)
            }
            ManagerError::PaymentLocked(_) => {
                AppError::with_message(ErrorCode::PaymentStatusLocked, message)
            }
            ManagerError::OrderNumberConflict(_) => {
                AppError::with_message(ErrorCode::OrderNumberConflict, message)
            }
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
