//! Staff dashboard and revenue report bodies
//!
//! Revenue only counts orders that are paid and not cancelled. Days are
//! business-timezone calendar days.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::OrderSummary;
use crate::models::MenuCategory;

/// Revenue for one business day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    pub orders: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub total_orders: u64,
    /// Rounded to 2 places; zero when there are no orders
    #[serde(with = "rust_decimal::serde::float")]
    pub average_order_value: Decimal,
}

/// Line revenue grouped by the menu item's current category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRevenue {
    pub category: MenuCategory,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    /// Units sold
    pub quantity: u64,
}

/// `GET /api/admin/reports/revenue`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub summary: RevenueSummary,
    /// Every day in the range, oldest first; empty days have zero revenue
    pub daily_revenue: Vec<DailyRevenue>,
    pub category_revenue: Vec<CategoryRevenue>,
    /// Mean placement-to-delivery time of delivered orders in the range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_delivery_minutes: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    /// Every order placed today, cancelled included
    pub orders: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopularItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub popularity: u64,
}

/// `GET /api/admin/dashboard`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today: TodayStats,
    /// pending + confirmed + preparing, any day
    pub pending_orders: u64,
    pub popular_items: Vec<PopularItem>,
    /// Newest first
    pub recent_orders: Vec<OrderSummary>,
    /// Last 7 business days including today
    pub weekly_revenue: Vec<DailyRevenue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_delivery_minutes: Option<f64>,
}
