//! Admin Order API Module
//!
//! 所有路由需要 staff 角色; 指派订单和营收报表额外需要 admin。
//!
//! | 路径 | 方法 | 说明 | 角色 |
//! |------|------|------|------|
//! | /api/admin/dashboard | GET | 今日订单/营收、待处理数、热门菜品 | staff |
//! | /api/admin/reports/revenue | GET | `startDate`..=`endDate` 营收报表 | admin |
//! | /api/admin/orders | GET | 全部订单 (分页, status, date) | staff |
//! | /api/admin/orders/{id} | GET | 订单详情 | staff |
//! | /api/admin/orders/{id}/assign | PATCH | 指派 | admin |
//! | /api/admin/orders/{id}/payment | PATCH | 支付状态 | staff |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch},
};

use crate::auth::{require_admin, require_staff};
use crate::core::ServerState;

/// Admin router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/dashboard", get(handler::dashboard))
        .route(
            "/reports/revenue",
            get(handler::revenue_report).route_layer(middleware::from_fn(require_admin)),
        )
        .route("/orders", get(handler::list))
        .route("/orders/{id}", get(handler::get_by_id))
        .route(
            "/orders/{id}/assign",
            patch(handler::assign).route_layer(middleware::from_fn(require_admin)),
        )
        .route("/orders/{id}/payment", patch(handler::update_payment))
        .route_layer(middleware::from_fn(require_staff))
}
