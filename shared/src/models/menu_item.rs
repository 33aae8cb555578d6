//! Menu Item Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MenuCategory {
    Coffee,
    Tea,
    Snacks,
    Desserts,
    Beverages,
    MainCourse,
    Appetizers,
}

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: MenuCategory,
    pub is_available: bool,
    #[serde(default)]
    pub is_vegetarian: bool,
    /// Preparation time in minutes
    #[serde(default)]
    pub preparation_time: u32,
    /// Total quantity ordered so far
    #[serde(default)]
    pub popularity: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: MenuCategory,
    pub is_available: Option<bool>,
    pub is_vegetarian: Option<bool>,
    pub preparation_time: Option<u32>,
}

/// Toggle availability payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityUpdate {
    pub is_available: bool,
}
