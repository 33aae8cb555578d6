//! Menu API Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::ErrorCode;
use shared::models::{AvailabilityUpdate, MenuCategory, MenuItem, MenuItemCreate};

use crate::api::{ApiJson, ApiQuery, ApiResponse, AppError, AppResult, ok};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::{MAX_PRICE, ManagerError};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MIN_NAME_LEN, trimmed_len, validate_optional_text,
    validate_required_text,
};

const POPULAR_DEFAULT_LIMIT: usize = 10;
const POPULAR_MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub category: Option<MenuCategory>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<usize>,
}

/// Available items, most popular first
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<MenuQuery>,
) -> AppResult<ApiResponse<Vec<MenuItem>>> {
    let items = state
        .orders
        .catalog()
        .list_menu_items(query.category, true)
        .map_err(ManagerError::from)?;
    Ok(ok(items))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MenuItem>> {
    let item = state
        .orders
        .catalog()
        .get_menu_item(&id)
        .map_err(ManagerError::from)?
        .ok_or_else(|| ManagerError::MenuItemNotFound(id))?;
    Ok(ok(item))
}

/// Create a menu item (admin)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<MenuItemCreate>,
) -> AppResult<(StatusCode, ApiResponse<MenuItem>)> {
    if !user.is_admin() {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }
    validate_create(&req)?;

    let now = Utc::now();
    let item = MenuItem {
        id: uuid::Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        description: req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        price: req.price,
        category: req.category,
        is_available: req.is_available.unwrap_or(true),
        is_vegetarian: req.is_vegetarian.unwrap_or(false),
        preparation_time: req.preparation_time.unwrap_or(0),
        popularity: 0,
        created_at: now,
        updated_at: now,
    };

    state
        .orders
        .catalog()
        .insert_menu_item(&item)
        .map_err(ManagerError::from)?;

    tracing::info!(menu_item_id = %item.id, name = %item.name, "Menu item created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Menu item created", item),
    ))
}

/// Toggle availability (staff)
pub async fn set_availability(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AvailabilityUpdate>,
) -> AppResult<ApiResponse<MenuItem>> {
    let item = state
        .orders
        .catalog()
        .set_availability(&id, req.is_available, Utc::now())
        .map_err(ManagerError::from)?
        .ok_or_else(|| ManagerError::MenuItemNotFound(id))?;

    tracing::info!(
        menu_item_id = %item.id,
        is_available = item.is_available,
        "Menu item availability changed"
    );
    Ok(ok(item))
}

/// Top items by popularity (staff)
pub async fn popular(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<PopularQuery>,
) -> AppResult<ApiResponse<Vec<MenuItem>>> {
    let limit = query.limit.unwrap_or(POPULAR_DEFAULT_LIMIT);
    if limit == 0 || limit > POPULAR_MAX_LIMIT {
        return Err(AppError::validation(format!(
            "limit must be between 1 and {}",
            POPULAR_MAX_LIMIT
        )));
    }

    let mut items = state
        .orders
        .catalog()
        .list_menu_items(None, false)
        .map_err(ManagerError::from)?;
    items.truncate(limit);
    Ok(ok(items))
}

fn validate_create(req: &MenuItemCreate) -> AppResult<()> {
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    if trimmed_len(&req.name) < MIN_NAME_LEN {
        return Err(AppError::validation(format!(
            "name must be at least {} characters",
            MIN_NAME_LEN
        ))
        .with_detail("field", "name"));
    }
    validate_optional_text(&req.description, "description", MAX_NOTE_LEN)?;
    if req.price < Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            "price must not be negative",
        ));
    }
    if req.price > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            format!("price must be at most {}", MAX_PRICE),
        ));
    }
    Ok(())
}
