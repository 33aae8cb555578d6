//! 服务层
//!
//! - [`build_router`] - 组装 HTTP 路由、认证和 tower-http 中间件

pub mod http;

pub use self::http::{build_app, build_router};
