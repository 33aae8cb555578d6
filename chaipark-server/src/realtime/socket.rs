//! socket.io 实时通道
//!
//! # 客户端事件
//!
//! | 事件 | 载荷 | 说明 |
//! |------|------|------|
//! | `join-admin` | `{token}` | staff/admin 令牌，加入 `admin` 房间 |
//! | `join_user_room` | `{userId, token}` | 令牌属于该用户，加入 `user_<id>` |
//! | `ping` | 任意 | 回复 `pong` |
//!
//! # 服务端事件
//!
//! `new-order` 只发到 `admin`；`order-status-updated` 和 `order-cancelled`
//! 同时发到 `admin` 和客户自己的 `user_<id>` 房间。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::models::UserRole;
use shared::order::OrderLifecycleEvent;
use socketioxide::SocketIo;
use socketioxide::extract::{Data, SocketRef};
use tokio::sync::broadcast::error::RecvError;

use super::bus::OrderEventBus;
use crate::auth::{Claims, JwtService};
use crate::security_log;

pub const ADMIN_ROOM: &str = "admin";

pub fn user_room(user_id: &str) -> String {
    format!("user_{}", user_id)
}

/// Rooms an event is delivered to
pub fn target_rooms(event: &OrderLifecycleEvent) -> Vec<String> {
    let mut rooms = vec![ADMIN_ROOM.to_string()];
    if event.notifies_customer() {
        rooms.push(user_room(&event.customer().id));
    }
    rooms
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinAdminPayload {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinUserRoomPayload {
    pub user_id: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
struct RoomJoined {
    room: String,
}

#[derive(Debug, Clone, Serialize)]
struct JoinRejected {
    message: &'static str,
}

/// Why a join request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDenied {
    InvalidToken,
    NotStaff,
    WrongUser,
}

impl JoinDenied {
    fn message(&self) -> &'static str {
        match self {
            JoinDenied::InvalidToken => "Invalid or expired token",
            JoinDenied::NotStaff => "Staff access required",
            JoinDenied::WrongUser => "Token does not belong to this user",
        }
    }
}

fn role_of(claims: &Claims) -> UserRole {
    claims.role.parse().unwrap_or_default()
}

/// Room for a `join-admin` request
pub fn authorize_admin_join(jwt: &JwtService, token: &str) -> Result<&'static str, JoinDenied> {
    let claims = jwt
        .validate_token(token)
        .map_err(|_| JoinDenied::InvalidToken)?;
    if !role_of(&claims).is_staff() {
        return Err(JoinDenied::NotStaff);
    }
    Ok(ADMIN_ROOM)
}

/// Room for a `join_user_room` request; staff may watch any customer
pub fn authorize_user_join(
    jwt: &JwtService,
    user_id: &str,
    token: &str,
) -> Result<String, JoinDenied> {
    let claims = jwt
        .validate_token(token)
        .map_err(|_| JoinDenied::InvalidToken)?;
    if claims.sub != user_id && !role_of(&claims).is_staff() {
        return Err(JoinDenied::WrongUser);
    }
    Ok(user_room(user_id))
}

fn reply_joined(socket: &SocketRef, room: String) {
    if let Err(e) = socket.emit("room-joined", &RoomJoined { room }) {
        tracing::debug!(socket_id = %socket.id, error = %e, "Failed to ack room join");
    }
}

fn reply_rejected(socket: &SocketRef, event: &'static str, denied: JoinDenied) {
    security_log!(
        "WARN",
        "socket_join_denied",
        socket_id = socket.id.to_string(),
        socket_event = event,
        reason = denied.message()
    );
    if let Err(e) = socket.emit(
        "join-error",
        &JoinRejected {
            message: denied.message(),
        },
    ) {
        tracing::debug!(socket_id = %socket.id, error = %e, "Failed to send join error");
    }
}

/// `join-admin`: 校验令牌后加入 admin 房间，回复 `room-joined` 或 `join-error`
pub fn handle_admin_join(socket: &SocketRef, jwt: &JwtService, token: &str) {
    match authorize_admin_join(jwt, token) {
        Ok(room) => {
            socket.join(room);
            tracing::info!(socket_id = %socket.id, "Admin joined room");
            reply_joined(socket, room.to_string());
        }
        Err(denied) => reply_rejected(socket, "join-admin", denied),
    }
}

/// `join_user_room`: 加入 `user_<id>` 房间
pub fn handle_user_join(socket: &SocketRef, jwt: &JwtService, payload: &JoinUserRoomPayload) {
    match authorize_user_join(jwt, &payload.user_id, &payload.token) {
        Ok(room) => {
            socket.join(room.clone());
            tracing::debug!(socket_id = %socket.id, room = %room, "User joined room");
            reply_joined(socket, room);
        }
        Err(denied) => reply_rejected(socket, "join_user_room", denied),
    }
}

/// Register connection and event handlers on the default namespace
pub fn register_handlers(io: &SocketIo, jwt: Arc<JwtService>) {
    io.ns("/", move |socket: SocketRef| {
        let jwt = jwt.clone();
        async move {
            tracing::debug!(socket_id = %socket.id, "Socket connected");

            let admin_jwt = jwt.clone();
            socket.on(
                "join-admin",
                move |socket: SocketRef, Data(payload): Data<JoinAdminPayload>| {
                    let jwt = admin_jwt.clone();
                    async move { handle_admin_join(&socket, &jwt, &payload.token) }
                },
            );

            let user_jwt = jwt;
            socket.on(
                "join_user_room",
                move |socket: SocketRef, Data(payload): Data<JoinUserRoomPayload>| {
                    let jwt = user_jwt.clone();
                    async move { handle_user_join(&socket, &jwt, &payload) }
                },
            );

            socket.on("ping", |socket: SocketRef| async move {
                let pong =
                    serde_json::json!({ "timestamp": chrono::Utc::now().timestamp_millis() });
                if let Err(e) = socket.emit("pong", &pong) {
                    tracing::debug!(socket_id = %socket.id, error = %e, "Failed to send pong");
                }
            });

            socket.on_disconnect(|socket: SocketRef| async move {
                tracing::debug!(socket_id = %socket.id, "Socket disconnected");
            });
        }
    });
}

/// Forward bus events to socket.io rooms until the bus shuts down
///
/// Emit failures are logged; the bridge keeps running.
pub async fn run_event_bridge(io: SocketIo, bus: OrderEventBus) {
    let mut rx = bus.subscribe();
    let shutdown = bus.shutdown_token().clone();
    tracing::debug!("Realtime event bridge started");

    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = rx.recv() => match received {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Realtime bridge lagged, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };

        let payload = match event.payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(event = event.name(), error = %e, "Failed to serialize event");
                continue;
            }
        };

        for room in target_rooms(&event) {
            if let Err(e) = io.to(room.clone()).emit(event.name(), &payload).await {
                tracing::warn!(
                    event = event.name(),
                    order_id = %event.order_id(),
                    room = %room,
                    error = %e,
                    "Realtime broadcast failed"
                );
            }
        }
    }

    tracing::debug!("Realtime event bridge stopped");
}
