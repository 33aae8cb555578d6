//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 客户订单接口 (下单、查询、取消、评分、追踪)
//! - [`admin`] - 订单后台接口 (staff / admin)
//! - [`menu`] - 菜单接口

pub mod admin;
pub mod health;
pub mod menu;
pub mod orders;

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::auth::CurrentUser;
use crate::orders::Actor;

// Re-export common types for handlers
pub use crate::utils::{ApiResponse, AppError, AppResult, ok};

/// JSON body whose rejections use the API error envelope
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string whose rejections use the API error envelope
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

impl From<&CurrentUser> for Actor {
    fn from(user: &CurrentUser) -> Self {
        Actor::new(user.id.clone(), user.username.clone(), user.role)
    }
}
