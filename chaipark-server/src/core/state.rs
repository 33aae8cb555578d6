use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result};
use crate::notify::TracingNotifier;
use crate::orders::{OrderStorage, OrdersManager};
use crate::realtime::{OrderEventBus, RealtimeHub, register_handlers, run_event_bridge};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 克隆成本低 (内部均为 Arc / 句柄)。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | storage | redb 存储 (订单 + 菜单) |
/// | orders | 订单生命周期管理器 |
/// | jwt_service | JWT 认证服务 |
/// | event_bus | 订单事件总线 |
/// | realtime | socket.io 句柄和 tower layer |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub storage: OrderStorage,
    pub orders: Arc<OrdersManager>,
    pub jwt_service: Arc<JwtService>,
    pub event_bus: OrderEventBus,
    pub realtime: RealtimeHub,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/orders.redb)
    /// 3. 订单管理器、事件总线、socket.io
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_path();
        let storage = OrderStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Order database opened");

        Ok(Self::with_storage(config.clone(), storage))
    }

    /// 使用已打开的存储构建状态 (测试使用内存数据库)
    pub fn with_storage(config: Config, storage: OrderStorage) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let event_bus = OrderEventBus::new(config.event_channel_capacity);
        let orders = Arc::new(OrdersManager::new(
            storage.clone(),
            Arc::new(TracingNotifier),
            Arc::new(event_bus.clone()),
            config.order_settings(),
        ));

        let realtime = RealtimeHub::new();
        register_handlers(&realtime.io, jwt_service.clone());

        Self {
            config,
            storage,
            orders,
            jwt_service,
            event_bus,
            realtime,
        }
    }

    /// 启动后台任务
    ///
    /// - 实时事件桥 (事件总线 → socket.io 房间)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let token = tasks.shutdown_token();
        let io = self.realtime.io.clone();
        let bus = self.event_bus.clone();
        tasks.spawn("realtime_bridge", TaskKind::Listener, async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = run_event_bridge(io, bus) => {}
            }
        });

        tasks.log_summary();
        tasks
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// 打印启动信息 (日志)
    pub fn log_startup_summary(&self) {
        let settings = self.orders.settings();
        tracing::info!("╔══════════════════════════════════════════════════════════════╗");
        tracing::info!("║                  CHAIPARK ORDER SERVER                       ║");
        tracing::info!("╚══════════════════════════════════════════════════════════════╝");
        tracing::info!("  Environment   : {}", self.config.environment);
        tracing::info!("  Work dir      : {}", self.config.work_dir);
        tracing::info!("  Timezone      : {}", settings.timezone);
        tracing::info!(
            "  Delivery fee  : {} (free above {})",
            settings.pricing.delivery_fee,
            settings.pricing.free_delivery_threshold
        );
        tracing::info!("  Transitions   : {}", settings.transition_policy.as_str());
        tracing::info!("  HTTP / socket : http://localhost:{}", self.config.http_port);
    }
}
