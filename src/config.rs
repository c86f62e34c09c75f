//! Gateway 连接配置

use std::time::Duration;

/// 默认 Gateway 地址
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:18789";

/// 默认会话 key（主 Agent 对话）
pub const DEFAULT_SESSION_KEY: &str = "main";

/// 默认 Agent ID
pub const DEFAULT_AGENT_ID: &str = "main";

/// 历史消息拉取条数（最近 N 条）
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// 轮询间隔（毫秒）
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// 请求超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Gateway 配置
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway 基础 URL（不带结尾 `/`）
    pub url: String,
    /// Bearer token（仅透传，不做校验）
    pub token: Option<String>,
    /// 单次请求超时（毫秒）
    pub timeout_ms: u64,
    /// 对话使用的会话 key
    pub session_key: String,
    /// 历史消息条数上限
    pub history_limit: u32,
    /// 对话轮询间隔（毫秒）
    pub poll_interval_ms: u64,
}

impl GatewayConfig {
    /// 指定地址创建配置，其余使用默认值
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            session_key: DEFAULT_SESSION_KEY.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// 从环境变量创建配置
    ///
    /// - `AGENT_DASHBOARD_GATEWAY_URL`: Gateway 地址
    /// - `AGENT_DASHBOARD_GATEWAY_TOKEN`: Bearer token
    /// - `AGENT_DASHBOARD_SESSION_KEY`: 对话会话 key
    pub fn from_env() -> Self {
        let url = std::env::var("AGENT_DASHBOARD_GATEWAY_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());

        let mut config = Self::new(&url);

        if let Ok(token) = std::env::var("AGENT_DASHBOARD_GATEWAY_TOKEN") {
            if !token.trim().is_empty() {
                config.token = Some(token);
            }
        }

        if let Ok(key) = std::env::var("AGENT_DASHBOARD_SESSION_KEY") {
            if !key.trim().is_empty() {
                config.session_key = key;
            }
        }

        config
    }

    /// 设置 token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// 设置对话会话 key
    pub fn with_session_key(mut self, key: &str) -> Self {
        self.session_key = key.to_string();
        self
    }

    /// 工具调用端点
    pub fn invoke_url(&self) -> String {
        format!("{}/tools/invoke", self.url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
