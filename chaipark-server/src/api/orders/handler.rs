//! Order API Handlers

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use shared::order::{
    CancelOrderRequest, CreateOrderRequest, CreateOrderResponse, Order, OrderList, OrderStatus,
    OrderSummary, OrderTracking, RateOrderRequest, StatusUpdateResponse, UpdateStatusRequest,
};

use crate::api::{ApiJson, ApiQuery, ApiResponse, AppError, AppResult, ok};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::Actor;

/// Query params for the caller's order list
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

/// Place an order
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, ApiResponse<CreateOrderResponse>)> {
    let order = state.orders.create_order(&Actor::from(&user), req).await?;
    let body = CreateOrderResponse {
        order: OrderSummary::from(&order),
    };
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Order placed successfully", body),
    ))
}

/// Caller's orders, newest first
pub async fn list_mine(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<ApiResponse<OrderList>> {
    let list = state.orders.list_my_orders(
        &Actor::from(&user),
        query.page,
        query.limit,
        query.status,
    )?;
    Ok(ok(list))
}

/// Order detail (owner or staff)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.get_order_for(&Actor::from(&user), &id)?;
    Ok(ok(order))
}

/// Staff status update
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> AppResult<ApiResponse<StatusUpdateResponse>> {
    let order = state
        .orders
        .update_status(&Actor::from(&user), &id, req)
        .await?;
    Ok(ok(StatusUpdateResponse {
        status: order.status,
        updated_at: order.updated_at,
    }))
}

/// Cancel (owner or staff); the body is optional
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<ApiResponse<Order>> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        CancelOrderRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::validation(format!("Invalid request body: {}", e)))?
    };

    let order = state
        .orders
        .cancel_order(&Actor::from(&user), &id, req)
        .await?;
    Ok(ApiResponse::success_with_message("Order cancelled", order))
}

/// Rate a delivered order (owner)
pub async fn rate(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RateOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .orders
        .rate_order(&Actor::from(&user), &id, req)
        .await?;
    Ok(ApiResponse::success_with_message("Thank you for your feedback", order))
}

/// Public tracking by order number
pub async fn track(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
) -> AppResult<ApiResponse<OrderTracking>> {
    let tracking = state.orders.track(&order_number, Utc::now())?;
    Ok(ok(tracking))
}
