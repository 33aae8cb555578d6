use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::auth::JwtConfig;
use crate::core::ServerError;
use crate::orders::{OrderSettings, PricingRules, TransitionPolicy};

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 4545 | HTTP / socket.io 端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_JSON | false | JSON 格式日志 |
/// | LOG_DIR | (无) | 日志文件目录，按天滚动 |
/// | BUSINESS_TIMEZONE | Asia/Kolkata | 订单号日期和按日查询使用的时区 |
/// | DELIVERY_FEE | 20 | 配送费 |
/// | FREE_DELIVERY_THRESHOLD | 500 | 小计超过该值免配送费 |
/// | ESTIMATED_DELIVERY_MINUTES | 45 | 预计送达时间 |
/// | STATUS_TRANSITION_POLICY | permissive | permissive / strict |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 优雅关闭超时(毫秒) |
/// | EVENT_CHANNEL_CAPACITY | 256 | 实时事件通道容量 |
/// | JWT_SECRET | (debug 构建自动生成) | 令牌密钥，至少 32 字符 |
///
/// ```ignore
/// WORK_DIR=/data/chaipark HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    pub timezone: Tz,
    pub delivery_fee: Decimal,
    pub free_delivery_threshold: Decimal,
    pub estimated_delivery_minutes: i64,
    pub transition_policy: TransitionPolicy,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
    pub event_channel_capacity: usize,
    /// 客户通知超时 (毫秒)
    pub notify_timeout_ms: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 非法值直接报错，避免静默回退到默认值
fn env_parsed<T: FromStr>(key: &str, default: T) -> Result<T, ServerError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ServerError::Config(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ServerError> {
        let defaults = OrderSettings::default();

        let timezone = match std::env::var("BUSINESS_TIMEZONE") {
            Ok(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|_| ServerError::Config(format!("Unknown BUSINESS_TIMEZONE: {}", name)))?,
            Err(_) => defaults.timezone,
        };

        let config = Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_parsed("HTTP_PORT", 4545)?,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            jwt: JwtConfig::from_env()?,
            timezone,
            delivery_fee: env_parsed("DELIVERY_FEE", defaults.pricing.delivery_fee)?,
            free_delivery_threshold: env_parsed(
                "FREE_DELIVERY_THRESHOLD",
                defaults.pricing.free_delivery_threshold,
            )?,
            estimated_delivery_minutes: env_parsed(
                "ESTIMATED_DELIVERY_MINUTES",
                defaults.estimated_delivery_minutes,
            )?,
            transition_policy: env_parsed("STATUS_TRANSITION_POLICY", defaults.transition_policy)?,
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
            event_channel_capacity: env_or("EVENT_CHANNEL_CAPACITY", 256),
            notify_timeout_ms: env_or("NOTIFY_TIMEOUT_MS", defaults.notify_timeout_ms),
        };
        config.validate()?;
        Ok(config)
    }

    /// 测试用配置 (固定密钥，不读环境变量)
    pub fn for_tests(work_dir: impl Into<String>, jwt: JwtConfig) -> Self {
        let defaults = OrderSettings::default();
        Self {
            work_dir: work_dir.into(),
            http_port: 0,
            environment: "test".into(),
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
            jwt,
            timezone: defaults.timezone,
            delivery_fee: defaults.pricing.delivery_fee,
            free_delivery_threshold: defaults.pricing.free_delivery_threshold,
            estimated_delivery_minutes: defaults.estimated_delivery_minutes,
            transition_policy: defaults.transition_policy,
            request_timeout_ms: 30000,
            shutdown_timeout_ms: 1000,
            event_channel_capacity: 64,
            notify_timeout_ms: defaults.notify_timeout_ms,
        }
    }

    fn validate(&self) -> Result<(), ServerError> {
        if self.delivery_fee < Decimal::ZERO {
            return Err(ServerError::Config("DELIVERY_FEE must not be negative".into()));
        }
        if self.free_delivery_threshold < Decimal::ZERO {
            return Err(ServerError::Config(
                "FREE_DELIVERY_THRESHOLD must not be negative".into(),
            ));
        }
        if self.estimated_delivery_minutes <= 0 {
            return Err(ServerError::Config(
                "ESTIMATED_DELIVERY_MINUTES must be positive".into(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(ServerError::Config(
                "EVENT_CHANNEL_CAPACITY must be positive".into(),
            ));
        }
        Ok(())
    }

    /// 订单业务设置
    pub fn order_settings(&self) -> OrderSettings {
        OrderSettings {
            pricing: PricingRules {
                delivery_fee: self.delivery_fee,
                free_delivery_threshold: self.free_delivery_threshold,
            },
            estimated_delivery_minutes: self.estimated_delivery_minutes,
            timezone: self.timezone,
            transition_policy: self.transition_policy,
            notify_timeout_ms: self.notify_timeout_ms,
        }
    }

    /// 数据库目录: {work_dir}/database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 订单数据库文件
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("orders.redb")
    }

    /// 创建工作目录结构
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        if let Some(dir) = &self.log_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
