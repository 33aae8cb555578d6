//! 客户通知
//!
//! 订单状态变化时通知客户。推送渠道 (FCM 等) 不在本服务内，
//! 默认实现 [`TracingNotifier`] 只记录日志。调用方必须把失败当作
//! 尽力而为：记录后吞掉，不影响主操作。

use async_trait::async_trait;
use shared::order::{Order, OrderStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotification {
    pub title: &'static str,
    pub message: String,
}

/// Customer-facing text for a status, `None` for `pending`
pub fn status_template(order_number: &str, status: OrderStatus) -> Option<StatusNotification> {
    let (title, message) = match status {
        OrderStatus::Pending => return None,
        OrderStatus::Confirmed => (
            "✅ Order Confirmed!",
            format!(
                "Your order #{} has been confirmed and is being prepared.",
                order_number
            ),
        ),
        OrderStatus::Preparing => (
            "👨‍🍳 Order Being Prepared",
            format!(
                "Your delicious order #{} is now being prepared with love!",
                order_number
            ),
        ),
        OrderStatus::Ready => (
            "🎉 Order Ready!",
            format!(
                "Great news! Your order #{} is ready for pickup/delivery.",
                order_number
            ),
        ),
        OrderStatus::OutForDelivery => (
            "🚚 Out for Delivery",
            format!("Your order #{} is on its way!", order_number),
        ),
        OrderStatus::Delivered => (
            "✨ Order Delivered!",
            format!(
                "Enjoy your meal! Your order #{} has been delivered. Thank you for choosing ChaiPark!",
                order_number
            ),
        ),
        OrderStatus::Cancelled => (
            "❌ Order Cancelled",
            format!(
                "Your order #{} has been cancelled. If you have any questions, please contact us.",
                order_number
            ),
        ),
    };
    Some(StatusNotification { title, message })
}

/// Customer notification channel
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify_status(&self, order: &Order, status: OrderStatus) -> Result<(), NotifyError>;
}

/// Log-only dispatcher
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationDispatcher for TracingNotifier {
    async fn notify_status(&self, order: &Order, status: OrderStatus) -> Result<(), NotifyError> {
        // pending 是初始状态，没有对应通知
        let Some(notification) = status_template(&order.order_number, status) else {
            tracing::debug!(order_number = %order.order_number, status = %status, "No notification for status");
            return Ok(());
        };

        tracing::info!(
            target: "notification",
            customer_id = %order.customer.id,
            customer_name = %order.customer.name,
            phone = %order.delivery_info.phone,
            order_number = %order.order_number,
            status = %status,
            title = notification.title,
            "{}",
            notification.message
        );
        Ok(())
    }
}
