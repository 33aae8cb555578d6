//! Order API Module
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/orders | POST | 下单 | 用户 |
//! | /api/orders | GET | 我的订单 | 用户 |
//! | /api/orders/{id} | GET | 订单详情 | 本人 / staff |
//! | /api/orders/{id}/status | PATCH | 更新状态 | staff |
//! | /api/orders/{id}/cancel | PATCH | 取消 | 本人 / staff |
//! | /api/orders/{id}/rating | POST | 评分 | 本人 |
//! | /api/orders/tracking/{orderNumber} | GET | 公开追踪 | 无 |

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list_mine))
        .route("/tracking/{order_number}", get(handler::track))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/cancel", patch(handler::cancel))
        .route("/{id}/rating", post(handler::rate))
}
