//! socket.io 实时通道测试
//!
//! 通过 engine.io 长轮询 (polling transport) 驱动注册好的事件处理器，
//! 请求走 tower::ServiceExt::oneshot，不监听端口。

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use chaipark_server::auth::{JwtConfig, JwtService};
use chaipark_server::core::BackgroundTasks;
use chaipark_server::services::build_router;
use chaipark_server::{Config, OrderStorage, ServerState};
use chrono::Utc;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use shared::models::{MenuCategory, MenuItem, UserRole};
use tower::ServiceExt;

const CHAI_ID: &str = "menu-masala-chai";
const POLL_WINDOW: Duration = Duration::from_millis(300);
const MAX_ATTEMPTS: usize = 20;

struct RealtimeApp {
    router: Router,
    jwt: JwtService,
    _tasks: BackgroundTasks,
}

impl RealtimeApp {
    fn new() -> Self {
        let jwt_config = JwtConfig {
            secret: "chaipark-realtime-test-secret-0123456789abcdef".to_string(),
            expiration_minutes: 60,
            issuer: "chaipark-server".to_string(),
            audience: "chaipark-clients".to_string(),
        };
        let config = Config::for_tests("/tmp/chaipark-realtime-tests", jwt_config.clone());
        let storage = OrderStorage::open_in_memory().unwrap();
        let now = Utc::now();
        storage
            .insert_menu_item(&MenuItem {
                id: CHAI_ID.to_string(),
                name: "Masala Chai".to_string(),
                description: None,
                price: Decimal::from(30),
                category: MenuCategory::Tea,
                is_available: true,
                is_vegetarian: true,
                preparation_time: 5,
                popularity: 0,
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        let state = ServerState::with_storage(config, storage);
        let tasks = state.start_background_tasks();
        Self {
            router: build_router(state),
            jwt: JwtService::with_config(jwt_config),
            _tasks: tasks,
        }
    }

    fn token(&self, user_id: &str, role: UserRole) -> String {
        self.jwt
            .generate_token(user_id, &format!("{}-name", user_id), role)
            .unwrap()
    }

    async fn raw(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// engine.io 握手 + 连接默认命名空间，返回 sid
    async fn connect(&self) -> String {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/socket.io/?EIO=4&transport=polling")
            .body(Body::empty())
            .unwrap();
        let (status, body) = self.raw(request).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let open: Value = serde_json::from_str(body.trim_start_matches('0')).unwrap();
        let sid = open["sid"].as_str().unwrap().to_string();

        self.post(&sid, "40").await;
        let ack = self.poll(&sid).await.unwrap_or_default();
        assert!(ack.starts_with("40"), "namespace connect not acked: {}", ack);
        sid
    }

    async fn post(&self, sid: &str, packet: &str) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/socket.io/?EIO=4&transport=polling&sid={}", sid))
            .header(header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(Body::from(packet.to_string()))
            .unwrap();
        let (status, body) = self.raw(request).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    /// 一次长轮询；窗口内没有数据返回 None
    async fn poll(&self, sid: &str) -> Option<String> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(format!("/socket.io/?EIO=4&transport=polling&sid={}", sid))
            .body(Body::empty())
            .unwrap();
        tokio::time::timeout(POLL_WINDOW, self.raw(request))
            .await
            .ok()
            .map(|(_, body)| body)
    }

    /// 发送事件直到收到包含 `needle` 的回包
    ///
    /// 命名空间的事件处理器在连接回执之后才注册，所以首个事件可能被丢弃。
    async fn emit_until(&self, sid: &str, event: &str, data: Value, needle: &str) -> String {
        let packet = format!("42{}", json!([event, data]));
        for _ in 0..MAX_ATTEMPTS {
            self.post(sid, &packet).await;
            match self.poll(sid).await {
                Some(body) if body.contains(needle) => return body,
                _ => {}
            }
        }
        panic!("no `{}` reply to `{}`", needle, event);
    }

    async fn wait_for(&self, sid: &str, needle: &str) -> String {
        for _ in 0..MAX_ATTEMPTS {
            match self.poll(sid).await {
                Some(body) if body.contains(needle) => return body,
                _ => {}
            }
        }
        panic!("`{}` never arrived", needle);
    }

    async fn place_order(&self, token: &str) -> Value {
        let body = json!({
            "items": [{ "menuItem": CHAI_ID, "quantity": 2 }],
            "paymentMethod": "cod",
            "deliveryInfo": {
                "name": "Asha",
                "phone": "9876543210",
                "address": "12 MG Road, Indiranagar"
            }
        });
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/orders")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = self.raw(request).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let value: Value = serde_json::from_str(&body).unwrap();
        value["data"]["order"].clone()
    }
}

#[tokio::test]
async fn test_staff_join_admin_room_and_receive_new_orders() {
    let app = RealtimeApp::new();
    let sid = app.connect().await;
    let staff = app.token("staff-1", UserRole::Staff);

    let reply = app
        .emit_until(&sid, "join-admin", json!({ "token": staff }), "room-joined")
        .await;
    assert!(reply.contains(r#""room":"admin""#), "{}", reply);

    let customer = app.token("cust-1", UserRole::User);
    let order = app.place_order(&customer).await;
    let order_number = order["orderNumber"].as_str().unwrap();

    let pushed = app.wait_for(&sid, "new-order").await;
    assert!(pushed.contains(order_number), "{}", pushed);
}

#[tokio::test]
async fn test_customer_cannot_join_admin_room() {
    let app = RealtimeApp::new();
    let sid = app.connect().await;
    let customer = app.token("cust-1", UserRole::User);

    let reply = app
        .emit_until(&sid, "join-admin", json!({ "token": customer }), "join-error")
        .await;
    assert!(reply.contains("Staff access required"), "{}", reply);
}

#[tokio::test]
async fn test_user_room_join_checks_token_owner() {
    let app = RealtimeApp::new();
    let sid = app.connect().await;
    let customer = app.token("cust-1", UserRole::User);

    let rejected = app
        .emit_until(
            &sid,
            "join_user_room",
            json!({ "userId": "cust-2", "token": customer }),
            "join-error",
        )
        .await;
    assert!(rejected.contains("does not belong"), "{}", rejected);

    let joined = app
        .emit_until(
            &sid,
            "join_user_room",
            json!({ "userId": "cust-1", "token": customer }),
            "room-joined",
        )
        .await;
    assert!(joined.contains("user_cust-1"), "{}", joined);
}

#[tokio::test]
async fn test_ping_gets_pong() {
    let app = RealtimeApp::new();
    let sid = app.connect().await;

    let reply = app.emit_until(&sid, "ping", json!({}), "pong").await;
    assert!(reply.contains("timestamp"), "{}", reply);
}
