//! 乐观消息日志
//!
//! 单个会话的内存消息日志。两个来源会修改它：
//! - 轮询：用 Gateway 返回的历史整体替换日志（`replace`）
//! - 本地发送：先追加一条临时消息，失败时按 ID 移除（`begin_send` / `finish_send`）
//!
//! 所有状态放在同一把锁里，每个操作都是一次完整的状态转换，
//! 读者不会看到中间状态。锁不会跨 `.await` 持有。

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::normalize::value_to_string;
use crate::types::{MessageContent, MessageRole, SessionMessage};

/// 日志条目 ID（本地生成）
pub type EntryId = Uuid;

/// 条目来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// 来自轮询快照
    Acknowledged,
    /// 本地发送、尚未被快照覆盖
    Provisional,
}

/// 日志条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: EntryId,
    pub origin: Origin,
    pub message: SessionMessage,
}

/// 日志整体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorePhase {
    /// 还没有任何数据
    Loading,
    /// 有快照，没有发送中的消息
    Idle,
    /// 有一条临时消息等待确认
    Sending,
}

/// 已开始的发送
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    /// 临时消息的 ID
    pub id: EntryId,
    /// 去掉首尾空白后的文本
    pub text: String,
}

/// 渲染用的消息（文本在读取时计算）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMessage {
    pub id: EntryId,
    pub role: MessageRole,
    pub text: String,
    pub is_user: bool,
    pub provisional: bool,
    pub timestamp: Option<i64>,
}

/// 一次原子读取的完整状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub phase: StorePhase,
    pub entries: Vec<LogEntry>,
    pub input: String,
}

#[derive(Debug, Default)]
struct StoreState {
    loaded: bool,
    in_flight: Option<EntryId>,
    entries: Vec<LogEntry>,
    input: String,
}

impl StoreState {
    fn phase(&self) -> StorePhase {
        if self.in_flight.is_some() {
            StorePhase::Sending
        } else if !self.loaded {
            StorePhase::Loading
        } else {
            StorePhase::Idle
        }
    }
}

/// 会话消息日志
pub struct ConversationStore {
    session_key: String,
    state: Mutex<StoreState>,
    /// 日志长度（只在长度变化时通知，用于滚动到底部）
    len_tx: watch::Sender<usize>,
    /// 日志版本（每次内容变化都递增，用于重新渲染）
    revision_tx: watch::Sender<u64>,
}

impl ConversationStore {
    /// 创建空日志（Loading 状态）
    pub fn new(session_key: &str) -> Self {
        let (len_tx, _) = watch::channel(0);
        let (revision_tx, _) = watch::channel(0);
        Self {
            session_key: session_key.to_string(),
            state: Mutex::new(StoreState::default()),
            len_tx,
            revision_tx,
        }
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    // ==================== 写操作 ====================

    /// 用快照整体替换日志
    ///
    /// 不做合并：已被 Gateway 确认的临时消息会以确认后的形式出现在快照里。
    pub fn replace(&self, messages: Vec<SessionMessage>) {
        let mut state = self.state.lock();
        state.entries = messages
            .into_iter()
            .map(|message| LogEntry {
                id: Uuid::new_v4(),
                origin: Origin::Acknowledged,
                message,
            })
            .collect();
        state.loaded = true;
        self.notify_changed(state.entries.len());
        tracing::trace!(
            "🔄 Log replaced: session_key={}, len={}",
            self.session_key,
            state.entries.len()
        );
    }

    /// 首次拉取失败时也要结束 Loading
    pub fn mark_loaded(&self) {
        self.state.lock().loaded = true;
    }

    /// 开始发送：追加一条临时用户消息
    ///
    /// 文本为空（去掉空白后）或已有发送中的消息时返回 `None`，不改变任何状态。
    /// 否则清空输入框、进入 Sending，并返回临时消息的 ID。
    pub fn begin_send(&self, text: &str, now_ms: i64) -> Option<PendingSend> {
        let mut state = self.state.lock();
        Self::begin_send_locked(&mut state, text, now_ms).map(|pending| {
            self.notify_changed(state.entries.len());
            pending
        })
    }

    /// 发送当前输入框内容
    pub fn submit_input(&self, now_ms: i64) -> Option<PendingSend> {
        let mut state = self.state.lock();
        let text = state.input.clone();
        Self::begin_send_locked(&mut state, &text, now_ms).map(|pending| {
            self.notify_changed(state.entries.len());
            pending
        })
    }

    fn begin_send_locked(state: &mut StoreState, text: &str, now_ms: i64) -> Option<PendingSend> {
        let trimmed = text.trim();
        if trimmed.is_empty() || state.in_flight.is_some() {
            return None;
        }

        let id = Uuid::new_v4();
        state.input.clear();
        state.in_flight = Some(id);
        state.entries.push(LogEntry {
            id,
            origin: Origin::Provisional,
            message: SessionMessage::user(trimmed, now_ms),
        });

        Some(PendingSend {
            id,
            text: trimmed.to_string(),
        })
    }

    /// 结束发送
    ///
    /// 成功时临时消息保留，等下一次快照覆盖；失败时按 ID 移除。
    /// 输入框不恢复。
    pub fn finish_send(&self, id: EntryId, accepted: bool) {
        let mut state = self.state.lock();
        if !accepted && Self::remove_locked(&mut state, id) {
            self.notify_changed(state.entries.len());
        }
        if state.in_flight == Some(id) {
            state.in_flight = None;
        }
    }

    /// 按 ID 移除临时消息（ID 已不存在时什么都不做）
    pub fn remove_provisional(&self, id: EntryId) -> bool {
        let mut state = self.state.lock();
        let removed = Self::remove_locked(&mut state, id);
        if removed {
            self.notify_changed(state.entries.len());
        }
        removed
    }

    fn remove_locked(state: &mut StoreState, id: EntryId) -> bool {
        let before = state.entries.len();
        state
            .entries
            .retain(|e| !(e.id == id && e.origin == Origin::Provisional));
        state.entries.len() != before
    }

    /// 修改输入框
    pub fn set_input(&self, input: &str) {
        self.state.lock().input = input.to_string();
    }

    /// 内容已变化：版本号总是递增，长度信号只在长度变化时触发
    fn notify_changed(&self, len: usize) {
        self.revision_tx.send_modify(|revision| *revision += 1);
        self.len_tx.send_if_modified(|current| {
            if *current != len {
                *current = len;
                true
            } else {
                false
            }
        });
    }

    // ==================== 读操作 ====================

    pub fn phase(&self) -> StorePhase {
        self.state.lock().phase()
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == StorePhase::Loading
    }

    pub fn is_sending(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    pub fn input(&self) -> String {
        self.state.lock().input.clone()
    }

    /// 发送按钮是否可用
    pub fn can_send(&self) -> bool {
        let state = self.state.lock();
        !state.input.trim().is_empty() && state.in_flight.is_none()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.state.lock().entries.clone()
    }

    pub fn messages(&self) -> Vec<SessionMessage> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    /// 渲染视图
    pub fn rendered(&self) -> Vec<RenderedMessage> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|e| RenderedMessage {
                id: e.id,
                role: e.message.role.clone(),
                text: message_text(&e.message.content),
                is_user: e.message.role.is_user(),
                provisional: e.origin == Origin::Provisional,
                timestamp: e.message.timestamp,
            })
            .collect()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock();
        StoreSnapshot {
            phase: state.phase(),
            entries: state.entries.clone(),
            input: state.input.clone(),
        }
    }

    /// 订阅日志长度变化
    pub fn subscribe_len(&self) -> watch::Receiver<usize> {
        self.len_tx.subscribe()
    }

    /// 订阅日志内容变化（包括长度不变的整体替换）
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }
}

type MessageKey = (String, String, Option<i64>);

fn message_key(message: &RenderedMessage) -> MessageKey {
    (
        message.role.as_str().to_string(),
        message.text.clone(),
        message.timestamp,
    )
}

/// 增量输出游标
///
/// 历史只返回最近 N 条，窗口满了以后新消息会让最早的消息滑出，
/// 长度不变。整体替换还会重新生成条目 ID，所以这里按
/// (role, text, timestamp) 把上一次快照的尾部和新快照的头部对齐，
/// 最长重叠之后的部分就是新增消息。只跟踪已确认的条目。
#[derive(Debug, Default)]
pub struct TranscriptCursor {
    acknowledged: Vec<MessageKey>,
}

impl TranscriptCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回上一次调用之后新出现的已确认消息
    pub fn advance(&mut self, rendered: &[RenderedMessage]) -> Vec<RenderedMessage> {
        let current: Vec<&RenderedMessage> = rendered.iter().filter(|m| !m.provisional).collect();
        let keys: Vec<MessageKey> = current.iter().map(|m| message_key(m)).collect();

        let overlap = overlap_len(&self.acknowledged, &keys);
        let fresh = current[overlap..].iter().map(|m| (*m).clone()).collect();

        self.acknowledged = keys;
        fresh
    }
}

/// `previous` 的后缀与 `current` 的前缀最长相等的长度
fn overlap_len(previous: &[MessageKey], current: &[MessageKey]) -> usize {
    let max = previous.len().min(current.len());
    (1..=max)
        .rev()
        .find(|&k| previous[previous.len() - k..] == current[..k])
        .unwrap_or(0)
}

/// 提取消息的可显示文本
///
/// - 字符串：原样
/// - 片段序列：所有 `type == "text"` 且非空的 text，用换行连接
/// - 其他：JSON 字符串形式
pub fn message_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .filter(|p| p.part_type == "text")
            .filter_map(|p| p.text.as_deref())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        MessageContent::Other(value) => value_to_string(value),
    }
}
