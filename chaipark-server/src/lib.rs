//! ChaiPark Server - 外卖点单订单服务
//!
//! # 架构概述
//!
//! - **订单** (`orders`): 下单、定价、订单号、状态机、取消与评分
//! - **存储** (`orders::storage`): 嵌入式 redb
//! - **认证** (`auth`): JWT (user / staff / admin)
//! - **实时推送** (`realtime`): 事件总线 + socket.io 房间
//! - **通知** (`notify`): 客户状态通知
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! chaipark-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── auth/          # JWT 认证、角色中间件
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 订单生命周期
//! ├── realtime/      # 事件总线、socket.io
//! ├── notify/        # 客户通知
//! ├── services/      # 路由组装、中间件
//! └── utils/         # 错误、日志、时区、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod notify;
pub mod orders;
pub mod realtime;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderStorage, OrdersManager};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
   _____ _           _ _____           _
  / ____| |         (_)  __ \         | |
 | |    | |__   __ _ _| |__) |_ _ _ __| | __
 | |    | '_ \ / _` | |  ___/ _` | '__| |/ /
 | |____| | | | (_| | | |  | (_| | |  |   <
  \_____|_| |_|\__,_|_|_|   \__,_|_|  |_|\_\
    "#
    );
}
