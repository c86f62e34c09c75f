//! Gateway 工具调用协议
//!
//! 通信方式：`POST /tools/invoke`，请求体 `{"tool": ..., "args": {...}}`，
//! 参数字段使用 camelCase。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// 已知的工具名常量
pub mod tool {
    pub const AGENTS_LIST: &str = "agents_list";
    pub const SESSIONS_LIST: &str = "sessions_list";
    pub const SESSIONS_HISTORY: &str = "sessions_history";
    pub const SESSIONS_SEND: &str = "sessions_send";
    pub const LIST_DIRECTORY: &str = "list_directory";
    pub const READ_FILE: &str = "read_file";
}

/// 请求类型（Dashboard → Gateway）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "args", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Request {
    /// 列出所有 Agent
    AgentsList {},

    /// 列出会话（每个会话附带最近 N 条消息）
    SessionsList { message_limit: u32 },

    /// 拉取会话历史（最近 limit 条）
    SessionsHistory { session_key: String, limit: u32 },

    /// 向会话发送消息
    SessionsSend { session_key: String, message: String },

    /// 列出 Agent 工作区目录
    ListDirectory { path: String, agent_id: String },

    /// 读取 Agent 工作区文件
    ReadFile { path: String, agent_id: String },
}

impl Request {
    /// 工具名
    pub fn tool_name(&self) -> &'static str {
        match self {
            Request::AgentsList {} => tool::AGENTS_LIST,
            Request::SessionsList { .. } => tool::SESSIONS_LIST,
            Request::SessionsHistory { .. } => tool::SESSIONS_HISTORY,
            Request::SessionsSend { .. } => tool::SESSIONS_SEND,
            Request::ListDirectory { .. } => tool::LIST_DIRECTORY,
            Request::ReadFile { .. } => tool::READ_FILE,
        }
    }

    /// 参数映射
    pub fn args(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        Ok(value
            .get_mut("args")
            .map(Value::take)
            .unwrap_or_else(|| Value::Object(Default::default())))
    }
}

/// 响应信封（Gateway → Dashboard）
///
/// 没有 `ok` 字段的响应体按原样透传。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// 解开响应信封，取出工具结果
pub fn unwrap_envelope(tool: &str, body: Value) -> Result<Value> {
    let is_envelope = body.get("ok").map(Value::is_boolean).unwrap_or(false)
        && (body.get("result").is_some() || body.get("error").is_some());
    if !is_envelope {
        return Ok(body);
    }

    let response: ToolResponse = serde_json::from_value(body)?;
    if !response.ok {
        return Err(Error::gateway(tool, error_message(response.error.as_ref())));
    }

    Ok(unwrap_tool_result(response.result.unwrap_or(Value::Null)))
}

/// 工具结果可能包在 `details` 或文本片段里
fn unwrap_tool_result(result: Value) -> Value {
    if let Some(details) = result.get("details") {
        if !details.is_null() {
            return details.clone();
        }
    }

    if let Some(parts) = result.get("content").and_then(Value::as_array) {
        let text: Vec<&str> = parts
            .iter()
            .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();
        if !text.is_empty() {
            let joined = text.join("\n");
            // 文本片段通常是 JSON 字符串
            return serde_json::from_str(&joined).unwrap_or(Value::String(joined));
        }
    }

    result
}

fn error_message(error: Option<&Value>) -> String {
    match error {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| v.to_string()),
        None => "unknown error".to_string(),
    }
}
