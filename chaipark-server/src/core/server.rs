//! Server Implementation
//!
//! HTTP + socket.io 服务器启动和优雅关闭

use std::net::SocketAddr;
use std::time::Duration;

use crate::core::{Config, Result, ServerState};
use crate::services::build_router;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        crate::api::health::mark_started();
        let tasks = state.start_background_tasks();
        state.log_startup_summary();

        let app = build_router(state.clone());
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let shutdown_timeout = Duration::from_millis(self.config.shutdown_timeout_ms);

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutting down..."),
                Err(e) => tracing::error!(error = %e, "Failed to listen for ctrl-c, shutting down"),
            }
            shutdown_handle.graceful_shutdown(Some(shutdown_timeout));
        });

        tracing::info!("🚀 Starting HTTP server on {}", addr);
        let served = axum_server::bind(addr)
            .handle(handle)
            .serve(app.into_make_service())
            .await;

        // 先停止事件总线，再等待后台任务退出
        state.event_bus.shutdown();
        tasks.shutdown(shutdown_timeout).await;

        served?;
        tracing::info!("Server stopped");
        Ok(())
    }
}
