//! agent-dashboard-core - Agent Gateway 运维面板的客户端同步层
//!
//! Gateway 是 Agent、会话、工作区文件的唯一数据源，面板本身不做任何持久化。
//!
//! # 核心功能
//!
//! - **响应归一化**: 把形态不稳定的 Gateway JSON 解码成类型化记录
//! - **工作区文件索引**: 文件名 → 逻辑路径 + 日期 key，最新在前
//! - **任务看板**: 会话按类型和更新时间分为 upcoming / ongoing / done
//! - **乐观消息日志**: 本地发送立即可见，与 3 秒轮询的整体替换共存
//!
//! # Feature Flags
//!
//! - `client`: 基于 reqwest 的 HTTP Gateway 客户端
//!
//! # 架构
//!
//! 所有远程调用都经过 [`Gateway`] trait，展示层只通过 [`Dashboard`]
//! 拿到已归一化的数据，错误在边界处降级为空列表或提示文案。

pub mod agents;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod files;
pub mod gateway;
pub mod normalize;
pub mod protocol;
pub mod store;
pub mod tasks;
pub mod types;

#[cfg(feature = "client")]
pub mod client;

// Re-exports
pub use chat::{ChatSession, PollHandle, SendOutcome};
pub use config::GatewayConfig;
pub use dashboard::{AgentConnections, Dashboard};
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use protocol::Request;
pub use store::{
    ConversationStore, EntryId, LogEntry, Origin, RenderedMessage, StorePhase, TranscriptCursor,
};
pub use tasks::{TaskBuckets, TaskColumn};
pub use types::*;

#[cfg(feature = "client")]
pub use client::HttpGateway;
