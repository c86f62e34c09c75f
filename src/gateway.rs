//! Gateway 抽象
//!
//! 统一的远程调用契约：按名字调用工具、传入参数映射，
//! 得到解码后的 JSON 或错误。HTTP 实现见 `client` 模块。

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::protocol::Request;

/// 远程工具调用
#[async_trait]
pub trait Gateway: Send + Sync {
    /// 调用工具
    async fn invoke(&self, tool: &str, args: Value) -> Result<Value>;

    /// 调用类型化请求
    async fn request(&self, request: &Request) -> Result<Value> {
        let args = request.args()?;
        tracing::debug!("➡️ invoke: tool={}", request.tool_name());
        self.invoke(request.tool_name(), args).await
    }
}
