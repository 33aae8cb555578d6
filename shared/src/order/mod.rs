//! Order domain types
//!
//! - [`types`]: order record, enums, request/response bodies
//! - [`event`]: lifecycle events for real-time listeners
//! - [`report`]: staff dashboard and revenue report bodies

pub mod event;
pub mod report;
pub mod types;

pub use event::{
    NewOrderPayload, OrderCancelledPayload, OrderLifecycleEvent, StatusUpdatedPayload,
};
pub use report::{
    CategoryRevenue, DailyRevenue, DashboardStats, PopularItem, RevenueReport, RevenueSummary,
    TodayStats,
};
pub use types::{
    AssignOrderRequest, CancelOrderRequest, CancellationReason, CreateOrderRequest,
    CreateOrderResponse, CustomerRef, Customization, DeliveryInfo, Order, OrderItem,
    OrderItemInput, OrderList, OrderNotes, OrderRating, OrderSource, OrderStatus, OrderSummary,
    OrderTracking, Pagination, PaymentMethod, PaymentStatus, Pricing, RateOrderRequest,
    StatusUpdateResponse, UpdatePaymentRequest, UpdateStatusRequest,
};
