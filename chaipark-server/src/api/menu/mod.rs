//! Menu API Module
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/menu | GET | 可售菜品 (可按 category 过滤) | 无 |
//! | /api/menu/{id} | GET | 菜品详情 | 无 |
//! | /api/menu | POST | 新建菜品 | admin |
//! | /api/menu/{id}/availability | PATCH | 上下架 | staff |
//! | /api/menu/stats/popular | GET | 热销排行 | staff |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch},
};

use crate::auth::require_staff;
use crate::core::ServerState;

/// Menu router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/menu", routes())
}

fn routes() -> Router<ServerState> {
    // POST / 在 handler 内校验 admin
    let open = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id));

    let staff = Router::new()
        .route("/{id}/availability", patch(handler::set_availability))
        .route("/stats/popular", get(handler::popular))
        .route_layer(middleware::from_fn(require_staff));

    open.merge(staff)
}
