//! 响应归一化
//!
//! Gateway 的响应形态不稳定：可能直接是数组，也可能包在 `agents` / `files` /
//! `entries` 等字段里。这里把任意 JSON 解码成类型化记录，从不失败：
//! 无法识别的形态一律得到空序列。

use serde_json::Value;

use crate::types::{
    Agent, Binding, ContentPart, MessageContent, MessageRole, SendAck, Session, SessionKind,
    SessionMessage,
};

/// 列表响应的已知形态
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<'a> {
    /// 响应体本身就是数组
    Bare(&'a [Value]),
    /// 响应体是对象，数组在某个已知字段里
    Wrapped { field: &'static str, items: &'a [Value] },
    /// 无法识别
    Unknown,
}

impl<'a> Listing<'a> {
    /// 列表元素（未知形态为空）
    pub fn items(&self) -> &'a [Value] {
        match self {
            Listing::Bare(items) => *items,
            Listing::Wrapped { items, .. } => *items,
            Listing::Unknown => &[],
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Listing::Unknown)
    }
}

/// 各记录类型对应的包装字段
pub const AGENT_FIELDS: &[&str] = &["agents"];
pub const SESSION_FIELDS: &[&str] = &["sessions"];
pub const MESSAGE_FIELDS: &[&str] = &["messages"];
pub const ENTRY_FIELDS: &[&str] = &["files", "entries"];

/// 识别列表形态：先看是否为数组，再按顺序检查已知字段
pub fn decode_listing<'a>(payload: &'a Value, fields: &[&'static str]) -> Listing<'a> {
    if let Some(items) = payload.as_array() {
        return Listing::Bare(items);
    }

    if let Some(obj) = payload.as_object() {
        for field in fields {
            if let Some(items) = obj.get(*field).and_then(Value::as_array) {
                return Listing::Wrapped { field: *field, items };
            }
        }
    }

    Listing::Unknown
}

/// JSON 值的字符串形式（字符串不带引号）
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(obj: &Value, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

/// 毫秒时间戳：接受整数或浮点
fn millis_field(obj: &Value, key: &str) -> Option<i64> {
    let value = obj.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

// ==================== Agent ====================

/// 解码 `agents_list` 响应
pub fn normalize_agents(payload: &Value) -> Vec<Agent> {
    decode_listing(payload, AGENT_FIELDS)
        .items()
        .iter()
        .filter_map(agent_from_value)
        .collect()
}

fn agent_from_value(value: &Value) -> Option<Agent> {
    if let Some(id) = value.as_str() {
        return Some(Agent::with_id(id));
    }

    let id = str_field(value, "id")?;
    let bindings = value
        .get("bindings")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(binding_from_value).collect())
        .unwrap_or_default();

    Some(Agent {
        id,
        name: str_field(value, "name"),
        is_default: bool_field(value, "default")
            .or_else(|| bool_field(value, "isDefault"))
            .unwrap_or(false),
        configured: bool_field(value, "configured").unwrap_or(true),
        workspace: str_field(value, "workspace"),
        model: str_field(value, "model"),
        bindings,
    })
}

fn binding_from_value(value: &Value) -> Binding {
    Binding {
        agent_id: str_field(value, "agentId"),
        match_channel: value
            .get("match")
            .and_then(|m| m.get("channel"))
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

// ==================== Session ====================

/// 解码 `sessions_list` 响应
pub fn normalize_sessions(payload: &Value) -> Vec<Session> {
    decode_listing(payload, SESSION_FIELDS)
        .items()
        .iter()
        .filter_map(session_from_value)
        .collect()
}

fn session_from_value(value: &Value) -> Option<Session> {
    let key = str_field(value, "key")?;
    let kind = str_field(value, "kind")
        .map(SessionKind::from)
        .unwrap_or_else(|| SessionKind::Other("unknown".to_string()));

    Some(Session {
        key,
        kind,
        display_name: str_field(value, "displayName"),
        channel: str_field(value, "channel"),
        updated_at: millis_field(value, "updatedAt"),
    })
}

// ==================== Message ====================

/// 解码 `sessions_history` 响应
pub fn normalize_messages(payload: &Value) -> Vec<SessionMessage> {
    messages_from_listing(&decode_listing(payload, MESSAGE_FIELDS))
}

/// 从已识别的列表中解码消息
pub fn messages_from_listing(listing: &Listing<'_>) -> Vec<SessionMessage> {
    listing.items().iter().map(message_from_value).collect()
}

fn message_from_value(value: &Value) -> SessionMessage {
    if let Some(text) = value.as_str() {
        return SessionMessage {
            role: MessageRole::Other("unknown".to_string()),
            content: MessageContent::Text(text.to_string()),
            timestamp: None,
        };
    }

    SessionMessage {
        role: str_field(value, "role")
            .map(MessageRole::from)
            .unwrap_or_else(|| MessageRole::Other("unknown".to_string())),
        content: value
            .get("content")
            .map(content_from_value)
            .unwrap_or_else(|| MessageContent::Text(String::new())),
        timestamp: millis_field(value, "timestamp"),
    }
}

/// 解码消息内容
pub fn content_from_value(value: &Value) -> MessageContent {
    match value {
        Value::String(s) => MessageContent::Text(s.clone()),
        Value::Array(items) => MessageContent::Parts(items.iter().map(part_from_value).collect()),
        other => MessageContent::Other(other.clone()),
    }
}

fn part_from_value(value: &Value) -> ContentPart {
    let mut extra = value.as_object().cloned().unwrap_or_default();
    let part_type = extra
        .remove("type")
        .as_ref()
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let text = match extra.remove("text") {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            // 非字符串的 text 原样放回
            extra.insert("text".to_string(), other);
            None
        }
        None => None,
    };

    ContentPart {
        part_type,
        text,
        extra,
    }
}

// ==================== Workspace ====================

/// 解码 `list_directory` 响应（元素保持原始 JSON，由文件索引器处理）
pub fn normalize_entries(payload: &Value) -> Vec<Value> {
    decode_listing(payload, ENTRY_FIELDS).items().to_vec()
}

/// 解码 `read_file` 响应：字符串或 `{content}`
pub fn normalize_read_content(payload: &Value) -> Option<String> {
    match payload {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => match obj.get("content") {
            Some(Value::Null) | None => None,
            Some(content) => Some(value_to_string(content)),
        },
        _ => None,
    }
}

// ==================== Send ====================

/// 解码 `sessions_send` 响应：只有明确的 `ok: true` 才算成功
pub fn normalize_send_ack(payload: &Value) -> SendAck {
    let ok = match payload {
        Value::Bool(b) => *b,
        other => bool_field(other, "ok").unwrap_or(false),
    };
    SendAck { ok }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_listing_shapes() {
        let bare = json!([1, 2]);
        assert_eq!(decode_listing(&bare, AGENT_FIELDS).items().len(), 2);

        let wrapped = json!({"entries": ["a"]});
        match decode_listing(&wrapped, ENTRY_FIELDS) {
            Listing::Wrapped { field, items } => {
                assert_eq!(field, "entries");
                assert_eq!(items.len(), 1);
            }
            other => panic!("Expected Wrapped, got {:?}", other),
        }

        // files 优先于 entries
        let both = json!({"files": ["f"], "entries": ["e1", "e2"]});
        assert_eq!(decode_listing(&both, ENTRY_FIELDS).items(), &[json!("f")]);

        // 字段存在但不是数组
        let wrong = json!({"agents": {"id": "x"}});
        assert_eq!(decode_listing(&wrong, AGENT_FIELDS), Listing::Unknown);
    }

    #[test]
    fn test_agent_defaults() {
        let agents = normalize_agents(&json!({"requester": "main", "agents": [
            "bare",
            {"id": "main", "default": true, "model": "m1",
             "bindings": [{"agentId": "main", "match": {"channel": "telegram"}}, {}]},
            {"name": "missing-id"},
            {"id": "ops", "isDefault": true, "configured": false}
        ]}));

        assert_eq!(agents.len(), 3);
        assert_eq!(agents[0], Agent::with_id("bare"));
        assert!(agents[1].is_default);
        assert_eq!(agents[1].model.as_deref(), Some("m1"));
        assert_eq!(agents[1].bindings[0].match_channel.as_deref(), Some("telegram"));
        assert_eq!(agents[1].bindings[1], Binding::default());
        assert!(agents[2].is_default);
        assert!(!agents[2].configured);
    }

    #[test]
    fn test_session_fields() {
        let sessions = normalize_sessions(&json!([
            {"key": "cron:daily", "kind": "cron", "updatedAt": 1700000000000i64},
            {"key": "main", "kind": "main", "displayName": "Main", "channel": "web", "updatedAt": 1.5e12},
            {"kind": "main"},
            {"key": "bare"}
        ]));

        assert_eq!(sessions.len(), 3);
        assert!(sessions[0].kind.is_cron());
        assert_eq!(sessions[1].display_name.as_deref(), Some("Main"));
        assert_eq!(sessions[1].updated_at, Some(1_500_000_000_000));
        assert_eq!(sessions[2].kind, SessionKind::Other("unknown".to_string()));
        assert_eq!(sessions[2].updated_at, None);
    }

    #[test]
    fn test_message_content_forms() {
        let messages = normalize_messages(&json!([
            {"role": "user", "content": "hi", "timestamp": 1},
            {"role": "assistant", "content": [{"type": "text", "text": "a"}, {"type": "image", "url": "x"}]},
            {"role": "tool", "content": {"weird": true}},
            {"role": "assistant"},
            "bare"
        ]));

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].content, MessageContent::Text("hi".to_string()));
        assert_eq!(messages[0].timestamp, Some(1));
        match &messages[1].content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[1].part_type, "image");
                assert_eq!(parts[1].extra["url"], "x");
            }
            other => panic!("Expected Parts, got {:?}", other),
        }
        assert_eq!(messages[2].role, MessageRole::Other("tool".to_string()));
        assert!(matches!(messages[2].content, MessageContent::Other(_)));
        assert_eq!(messages[3].content, MessageContent::Text(String::new()));
        assert_eq!(messages[4].role, MessageRole::Other("unknown".to_string()));
    }

    #[test]
    fn test_read_content() {
        assert_eq!(normalize_read_content(&json!("# hi")), Some("# hi".to_string()));
        assert_eq!(normalize_read_content(&json!({"content": "body"})), Some("body".to_string()));
        assert_eq!(normalize_read_content(&json!({"content": 12})), Some("12".to_string()));
        assert_eq!(normalize_read_content(&json!({"content": null})), None);
        assert_eq!(normalize_read_content(&json!({"other": 1})), None);
        assert_eq!(normalize_read_content(&json!(null)), None);
    }

    #[test]
    fn test_send_ack() {
        assert!(normalize_send_ack(&json!({"ok": true})).ok);
        assert!(normalize_send_ack(&json!(true)).ok);
        assert!(!normalize_send_ack(&json!({"ok": false})).ok);
        assert!(!normalize_send_ack(&json!({"ok": "yes"})).ok);
        assert!(!normalize_send_ack(&json!({})).ok);
        assert!(!normalize_send_ack(&Value::Null).ok);
    }
}
