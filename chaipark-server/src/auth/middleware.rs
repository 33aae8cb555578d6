//! 认证中间件
//!
//! 为 JWT 认证和角色检查提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::{HeaderMap, Method, Uri};
use shared::ErrorCode;

use crate::AppError;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// 无需登录的路由
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径 (`/health`, socket.io 握手, 404)
/// - `GET /api/orders/tracking/{orderNumber}` (公开追踪)
/// - `GET /api/menu`, `GET /api/menu/{id}` (菜单浏览)
pub fn is_public_route(method: &Method, path: &str) -> bool {
    if method == Method::OPTIONS || !path.starts_with("/api/") {
        return true;
    }
    if method != Method::GET {
        return false;
    }
    if path.starts_with("/api/orders/tracking/") {
        return true;
    }
    (path == "/api/menu" || path.starts_with("/api/menu/")) && !path.starts_with("/api/menu/stats")
}

/// 从请求头解析并校验访问令牌
pub(crate) fn authenticate(
    jwt_service: &JwtService,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<CurrentUser, AppError> {
    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = uri.path().to_string());
            return Err(AppError::unauthorized());
        }
    };

    let claims = match jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = uri.path().to_string()
            );
            return match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            };
        }
    };

    CurrentUser::try_from(claims).map_err(|e| {
        security_log!("WARN", "auth_bad_claims", error = e.to_string());
        AppError::invalid_token(format!("Malformed JWT claims: {}", e))
    })
}

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT，
/// 成功后将 [`CurrentUser`] 注入请求扩展。公共路由见 [`is_public_route`]。
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 Unauthorized |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 InvalidToken |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public_route(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let user = authenticate(state.get_jwt_service(), req.headers(), req.uri())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// staff 中间件 - 要求 staff 或 admin 角色
pub async fn require_staff(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::unauthorized())?;
    if !user.is_staff() {
        security_log!(
            "WARN",
            "staff_required",
            user_id = user.id.clone(),
            user_role = user.role.as_str(),
            uri = req.uri().path().to_string()
        );
        return Err(AppError::new(ErrorCode::StaffRequired));
    }

    Ok(next.run(req).await)
}

/// 管理员中间件 - 要求 admin 角色
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::unauthorized())?;
    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id.clone(),
            user_role = user.role.as_str(),
            uri = req.uri().path().to_string()
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        assert!(is_public_route(&Method::GET, "/health"));
        assert!(is_public_route(&Method::GET, "/socket.io/"));
        assert!(is_public_route(&Method::OPTIONS, "/api/orders"));
        assert!(is_public_route(&Method::GET, "/api/orders/tracking/CP250101001"));
        assert!(is_public_route(&Method::GET, "/api/menu"));
        assert!(is_public_route(&Method::GET, "/api/menu/chai"));

        assert!(!is_public_route(&Method::GET, "/api/orders"));
        assert!(!is_public_route(&Method::POST, "/api/orders"));
        assert!(!is_public_route(&Method::POST, "/api/menu"));
        assert!(!is_public_route(&Method::PATCH, "/api/menu/chai/availability"));
        assert!(!is_public_route(&Method::GET, "/api/menu/stats/popular"));
        assert!(!is_public_route(&Method::GET, "/api/admin/orders"));
        assert!(!is_public_route(&Method::GET, "/api/menuitems"));
    }
}
