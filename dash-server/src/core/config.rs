use std::time::Duration;

use dash_client::ClientConfig;

/// Where configs, overrides and widget data come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// REST backend via `dash-client`
    Http,
    /// In-process [`MemoryStore`](crate::store::MemoryStore), empty at start
    Memory,
}

impl StoreMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Self::Memory,
            _ => Self::Http,
        }
    }
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3100 | API 服务端口 |
/// | BACKEND_URL | http://localhost:8080 | REST 后端地址 |
/// | BACKEND_TOKEN | - | 后端 Bearer token |
/// | REQUEST_TIMEOUT_MS | 30000 | 后端请求超时(毫秒) |
/// | WIDGET_FETCH_TIMEOUT_MS | 10000 | 单个组件数据请求超时(毫秒) |
/// | SESSION_IDLE_TTL_SECS | 1800 | 会话空闲过期(秒) |
/// | SESSION_SWEEP_INTERVAL_SECS | 60 | 过期会话清理间隔(秒) |
/// | STORE_MODE | http | http / memory |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志 |
/// | LOG_DIR | - | 日志文件目录 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// BACKEND_URL=http://erp:8080 HTTP_PORT=8088 cargo run -p dash-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// REST 后端地址
    pub backend_url: String,
    pub backend_token: Option<String>,
    /// 后端请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 组件数据请求超时时间 (毫秒)
    pub widget_fetch_timeout_ms: u64,
    /// 会话空闲过期时间 (秒)
    pub session_idle_ttl_secs: u64,
    pub session_sweep_interval_secs: u64,
    pub store_mode: StoreMode,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3100),
            backend_url: std::env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            backend_token: std::env::var("BACKEND_TOKEN").ok().filter(|t| !t.is_empty()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            widget_fetch_timeout_ms: std::env::var("WIDGET_FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
            session_idle_ttl_secs: std::env::var("SESSION_IDLE_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(1800),
            session_sweep_interval_secs: std::env::var("SESSION_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or(60),
            store_mode: std::env::var("STORE_MODE")
                .map(|v| StoreMode::parse(&v))
                .unwrap_or(StoreMode::Http),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// In-memory stores on the given port, for tests
    pub fn for_memory(http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.http_port = http_port;
        config.store_mode = StoreMode::Memory;
        config
    }

    pub fn widget_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.widget_fetch_timeout_ms)
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_secs)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval_secs.max(1))
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(self.backend_url.clone()).with_timeout_ms(self.request_timeout_ms);
        match &self.backend_token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
