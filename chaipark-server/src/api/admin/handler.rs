//! Admin Order Handlers

use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;
use shared::order::{
    AssignOrderRequest, DashboardStats, Order, OrderList, OrderStatus, RevenueReport,
    UpdatePaymentRequest,
};

use crate::api::{ApiJson, ApiQuery, ApiResponse, AppResult, ok};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::Actor;
use crate::utils::time::parse_date;

/// Query params for the admin order list
#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
    /// Business day (YYYY-MM-DD)
    pub date: Option<String>,
}

/// Query params for the revenue report (inclusive business days)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueQuery {
    pub start_date: String,
    pub end_date: String,
}

/// Staff dashboard
pub async fn dashboard(State(state): State<ServerState>) -> AppResult<ApiResponse<DashboardStats>> {
    Ok(ok(state.orders.dashboard(Utc::now())?))
}

/// Revenue report (admin)
pub async fn revenue_report(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<RevenueQuery>,
) -> AppResult<ApiResponse<RevenueReport>> {
    let start = parse_date(&query.start_date)?;
    let end = parse_date(&query.end_date)?;
    Ok(ok(state.orders.revenue_report(start, end)?))
}

/// All orders, newest first
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<AdminListQuery>,
) -> AppResult<ApiResponse<OrderList>> {
    let date = query.date.as_deref().map(parse_date).transpose()?;
    let list = state
        .orders
        .list_all(query.page, query.limit, query.status, date)?;
    Ok(ok(list))
}

/// Any order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    Ok(ok(state.orders.get_order(&id)?))
}

/// Assign to a staff member (admin only)
pub async fn assign(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AssignOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .orders
        .assign(&Actor::from(&user), &id, &req.assigned_to)?;
    Ok(ApiResponse::success_with_message("Order assigned", order))
}

pub async fn update_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdatePaymentRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .orders
        .update_payment(&Actor::from(&user), &id, req.payment_status)?;
    Ok(ok(order))
}
