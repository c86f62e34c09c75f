//! 数据类型定义
//!
//! 所有记录都是每次拉取重新生成的只读快照，不做原地修改。
//! 使用 camelCase 序列化，与 Gateway JSON 保持一致。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Agent 绑定（渠道路由）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub agent_id: Option<String>,
    /// `match.channel`，缺省表示匹配任意渠道
    pub match_channel: Option<String>,
}

/// Agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: Option<String>,
    /// 是否为默认 Agent（上游不保证唯一）
    pub is_default: bool,
    pub configured: bool,
    pub workspace: Option<String>,
    pub model: Option<String>,
    pub bindings: Vec<Binding>,
}

impl Agent {
    /// 只有 ID 的 Agent（其余字段取默认值）
    pub fn with_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            is_default: false,
            configured: true,
            workspace: None,
            model: None,
            bindings: Vec::new(),
        }
    }
}

/// 会话类型
///
/// `cron` 会被任务看板归入 upcoming，其余都是对话类会话。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionKind {
    Cron,
    Main,
    Group,
    Other(String),
}

impl SessionKind {
    pub fn as_str(&self) -> &str {
        match self {
            SessionKind::Cron => "cron",
            SessionKind::Main => "main",
            SessionKind::Group => "group",
            SessionKind::Other(s) => s,
        }
    }

    pub fn is_cron(&self) -> bool {
        matches!(self, SessionKind::Cron)
    }
}

impl From<&str> for SessionKind {
    fn from(s: &str) -> Self {
        match s {
            "cron" => SessionKind::Cron,
            "main" => SessionKind::Main,
            "group" => SessionKind::Group,
            other => SessionKind::Other(other.to_string()),
        }
    }
}

impl From<String> for SessionKind {
    fn from(s: String) -> Self {
        SessionKind::from(s.as_str())
    }
}

impl From<SessionKind> for String {
    fn from(kind: SessionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 会话
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// 会话 key（快照内唯一，跨轮询稳定）
    pub key: String,
    pub kind: SessionKind,
    pub display_name: Option<String>,
    pub channel: Option<String>,
    /// 最后更新时间（毫秒时间戳）
    pub updated_at: Option<i64>,
}

/// 消息角色
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageRole {
    User,
    Assistant,
    Other(String),
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Other(s) => s,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, MessageRole::User)
    }
}

impl From<&str> for MessageRole {
    fn from(s: &str) -> Self {
        match s {
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            other => MessageRole::Other(other.to_string()),
        }
    }
}

impl From<String> for MessageRole {
    fn from(s: String) -> Self {
        MessageRole::from(s.as_str())
    }
}

impl From<MessageRole> for String {
    fn from(role: MessageRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 内容片段（`type` 判别，只有 `text` 类型参与文本渲染）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// 其他字段原样保留
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContentPart {
    pub fn text(text: &str) -> Self {
        Self {
            part_type: "text".to_string(),
            text: Some(text.to_string()),
            extra: serde_json::Map::new(),
        }
    }
}

/// 消息内容：纯字符串或片段序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    /// 未知形态，渲染时转为字符串
    Other(serde_json::Value),
}

/// 会话消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: MessageRole,
    pub content: MessageContent,
    /// 毫秒时间戳
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl SessionMessage {
    /// 用户发出的纯文本消息
    pub fn user(text: &str, timestamp: i64) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(text.to_string()),
            timestamp: Some(timestamp),
        }
    }

    /// 可显示文本（每次按内容重新计算）
    pub fn text(&self) -> String {
        crate::store::message_text(&self.content)
    }
}

/// 工作区文件分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Report,
    Feedback,
}

impl FileCategory {
    /// 目录名（同时作为 path 命名空间）
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Report => "report",
            FileCategory::Feedback => "feedback",
        }
    }

    /// 复数展示名（空状态文案用）
    pub fn plural_label(&self) -> &'static str {
        match self {
            FileCategory::Report => "reports",
            FileCategory::Feedback => "feedback",
        }
    }
}

impl FromStr for FileCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report" => Ok(FileCategory::Report),
            "feedback" => Ok(FileCategory::Feedback),
            _ => Err(Error::InvalidCategory(s.to_string())),
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 工作区文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceFile {
    pub name: String,
    /// 逻辑路径（`{category}/{name}` 或 Gateway 给出的 path）
    pub path: String,
    /// 日期 key：文件名中的 `DD-MM-YYYY`，没有则为文件名本身
    pub date: String,
    pub agent_id: String,
}

/// 发送确认
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendAck {
    pub ok: bool,
}
