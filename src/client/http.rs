//! HTTP Gateway 客户端
//!
//! `POST {url}/tools/invoke`，Bearer 认证（可选），JSON 请求/响应。

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::protocol::unwrap_envelope;

/// HTTP Gateway 客户端
pub struct HttpGateway {
    http: reqwest::Client,
    invoke_url: String,
    token: Option<String>,
}

impl HttpGateway {
    /// 从配置构造客户端
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(Error::Config("gateway url is empty".to_string()));
        }

        let invoke_url = config.invoke_url();
        tracing::info!(
            "🔌 Gateway client ready: {} (auth: {})",
            invoke_url,
            if config.token.is_some() { "bearer" } else { "none" }
        );

        Ok(Self {
            http: reqwest::Client::builder().timeout(config.timeout()).build()?,
            invoke_url,
            token: config.token.clone(),
        })
    }

    pub fn invoke_url(&self) -> &str {
        &self.invoke_url
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn invoke(&self, tool: &str, args: Value) -> Result<Value> {
        let mut builder = self
            .http
            .post(&self.invoke_url)
            .json(&json!({ "tool": tool, "args": args }));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            // 失败时 Gateway 也可能返回 {ok:false, error}
            if let Ok(body) = serde_json::from_str::<Value>(&text) {
                unwrap_envelope(tool, body)?;
            }
            return Err(Error::gateway(tool, format!("HTTP {}: {}", status, text)));
        }

        let body: Value = serde_json::from_str(&text)?;
        unwrap_envelope(tool, body)
    }
}
