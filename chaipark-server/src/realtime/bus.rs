//! 订单事件总线
//!
//! ```text
//! OrdersManager ──publish()──▶ broadcast::Sender<OrderLifecycleEvent>
//!                                      │
//!                          ┌───────────┴───────────┐
//!                          ▼                       ▼
//!                   socket.io bridge         other subscribers
//! ```
//!
//! 发布是同步、非阻塞的；没有订阅者不算错误。

use shared::order::OrderLifecycleEvent;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Event bus closed")]
    Closed,

    #[error("Publish failed: {0}")]
    Failed(String),
}

/// Outbound lifecycle events
///
/// Implementations must not block; failures are logged by the caller and
/// never undo the operation that produced the event.
pub trait OrderEventPublisher: Send + Sync {
    fn publish(&self, event: OrderLifecycleEvent) -> Result<(), PublishError>;
}

/// Default publisher backed by a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct OrderEventBus {
    tx: broadcast::Sender<OrderLifecycleEvent>,
    shutdown_token: CancellationToken,
}

impl OrderEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderLifecycleEvent> {
        self.tx.subscribe()
    }

    #[cfg(test)]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// Stop background subscribers
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }
}

impl OrderEventPublisher for OrderEventBus {
    fn publish(&self, event: OrderLifecycleEvent) -> Result<(), PublishError> {
        if self.shutdown_token.is_cancelled() {
            return Err(PublishError::Closed);
        }
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(event = name, receivers, "Order event published");
            }
            Err(_) => {
                // 没有订阅者 (例如测试或 socket 桥未启动)
                tracing::debug!(event = name, "Order event published with no subscribers");
            }
        }
        Ok(())
    }
}
