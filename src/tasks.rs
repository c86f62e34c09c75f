//! 任务看板分类
//!
//! 把会话快照划分为 upcoming / ongoing / done 三列：
//! 1. `cron` 会话 → upcoming
//! 2. 30 分钟内有更新 → ongoing
//! 3. 其余 → done（包括没有 `updatedAt` 的会话）

use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::types::Session;

/// ongoing 判定窗口（毫秒）
pub const ONGOING_WINDOW_MS: i64 = 30 * 60 * 1000;

/// 看板列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskColumn {
    Upcoming,
    Ongoing,
    Done,
}

impl TaskColumn {
    pub fn title(&self) -> &'static str {
        match self {
            TaskColumn::Upcoming => "Upcoming",
            TaskColumn::Ongoing => "Ongoing",
            TaskColumn::Done => "Done",
        }
    }
}

/// 分类结果（三列互斥，且覆盖全部输入）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskBuckets {
    pub upcoming: Vec<Session>,
    pub ongoing: Vec<Session>,
    pub done: Vec<Session>,
}

impl TaskBuckets {
    pub fn len(&self) -> usize {
        self.upcoming.len() + self.ongoing.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按列取会话
    pub fn column(&self, column: TaskColumn) -> &[Session] {
        match column {
            TaskColumn::Upcoming => &self.upcoming,
            TaskColumn::Ongoing => &self.ongoing,
            TaskColumn::Done => &self.done,
        }
    }
}

/// 判定单个会话所在列
pub fn classify(session: &Session, now_ms: i64) -> TaskColumn {
    if session.kind.is_cron() {
        return TaskColumn::Upcoming;
    }

    match session.updated_at {
        // 时钟偏差导致的未来时间也算 ongoing
        Some(updated_at) if now_ms.saturating_sub(updated_at) < ONGOING_WINDOW_MS => TaskColumn::Ongoing,
        _ => TaskColumn::Done,
    }
}

/// 分类会话快照（列内保持输入顺序）
pub fn categorize(sessions: &[Session], now_ms: i64) -> TaskBuckets {
    let mut buckets = TaskBuckets::default();

    for session in sessions {
        let target = match classify(session, now_ms) {
            TaskColumn::Upcoming => &mut buckets.upcoming,
            TaskColumn::Ongoing => &mut buckets.ongoing,
            TaskColumn::Done => &mut buckets.done,
        };
        target.push(session.clone());
    }

    buckets
}

/// 以当前时间分类
pub fn categorize_now(sessions: &[Session]) -> TaskBuckets {
    categorize(sessions, now_ms())
}

/// 当前毫秒时间戳
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// 卡片标题：displayName 为空时用 key
pub fn session_label(session: &Session) -> &str {
    match session.display_name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => &session.key,
    }
}

/// 需要展示的渠道（`unknown` 不展示）
pub fn visible_channel(session: &Session) -> Option<&str> {
    session
        .channel
        .as_deref()
        .filter(|c| !c.is_empty() && *c != "unknown")
}

/// 相对时间文案
pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff_secs = now_ms.saturating_sub(timestamp_ms) / 1000;

    if diff_secs < 60 {
        return "just now".to_string();
    }
    let minutes = diff_secs / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{}d ago", days);
    }

    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => format!("{}d ago", days),
    }
}
