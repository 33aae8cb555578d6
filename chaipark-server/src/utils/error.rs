//! 统一错误处理
//!
//! 错误类型定义在 `shared::error`，这里重新导出并提供响应辅助函数。
//!
//! # 使用示例
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::not_found("Order abc"))
//!
//! // 返回成功响应
//! Ok(ok(data))
//! ```

use serde::Serialize;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> ApiResponse<T> {
    ApiResponse::success(data)
}
