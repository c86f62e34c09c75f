//! Dashboard 边界服务
//!
//! 展示层只能拿到这里返回的类型化序列，看不到 Gateway 的原始响应。
//! 列表类操作失败时返回空序列，内容读取失败时返回提示文案，
//! 错误只记录日志，不向上抛。

use std::sync::Arc;

use serde::Serialize;

use crate::agents::{channel_links, default_agents, ChannelLink};
use crate::chat::ChatSession;
use crate::config::{GatewayConfig, DEFAULT_AGENT_ID};
use crate::files::{index_entries, sort_newest_first, FAILED_TO_LOAD, NO_CONTENT};
use crate::gateway::Gateway;
use crate::normalize::{normalize_agents, normalize_entries, normalize_read_content, normalize_sessions};
use crate::protocol::Request;
use crate::tasks::{categorize, now_ms, TaskBuckets};
use crate::types::{Agent, FileCategory, Session, WorkspaceFile};

/// 任务看板每个会话附带的消息条数
pub const TASK_MESSAGE_LIMIT: u32 = 1;

/// Agent 连接视图
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConnections {
    pub agents: Vec<Agent>,
    pub links: Vec<ChannelLink>,
}

/// Dashboard 服务
pub struct Dashboard<G: Gateway + 'static> {
    gateway: Arc<G>,
    config: GatewayConfig,
}

impl<G: Gateway + 'static> Dashboard<G> {
    pub fn new(gateway: G, config: GatewayConfig) -> Self {
        Self {
            gateway: Arc::new(gateway),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    // ==================== Agents ====================

    /// Agent 列表
    pub async fn agents(&self) -> Vec<Agent> {
        let agents = match self.gateway.request(&Request::AgentsList {}).await {
            Ok(payload) => normalize_agents(&payload),
            Err(e) => {
                tracing::warn!("[agents] Failed to fetch agents: {}", e);
                return Vec::new();
            }
        };

        let defaults = default_agents(&agents);
        if defaults.len() > 1 {
            let ids: Vec<&str> = defaults.iter().map(|a| a.id.as_str()).collect();
            tracing::warn!("[agents] Multiple default agents reported by gateway: {:?}", ids);
        }

        agents
    }

    /// Agent 连接图
    pub async fn connections(&self) -> AgentConnections {
        let agents = self.agents().await;
        let links = channel_links(&agents);
        AgentConnections { agents, links }
    }

    // ==================== Tasks ====================

    /// 会话列表
    pub async fn sessions(&self) -> Vec<Session> {
        let request = Request::SessionsList {
            message_limit: TASK_MESSAGE_LIMIT,
        };
        match self.gateway.request(&request).await {
            Ok(payload) => normalize_sessions(&payload),
            Err(e) => {
                tracing::warn!("[sessions] Failed to fetch sessions: {}", e);
                Vec::new()
            }
        }
    }

    /// 任务看板（按当前时间分类）
    pub async fn task_board(&self) -> TaskBuckets {
        let sessions = self.sessions().await;
        categorize(&sessions, now_ms())
    }

    // ==================== Workspace ====================

    /// 工作区文件列表（最新在前）
    pub async fn workspace_files(&self, category: FileCategory, agent_id: Option<&str>) -> Vec<WorkspaceFile> {
        let agent_id = agent_id.unwrap_or(DEFAULT_AGENT_ID);
        let request = Request::ListDirectory {
            path: category.as_str().to_string(),
            agent_id: agent_id.to_string(),
        };

        let entries = match self.gateway.request(&request).await {
            Ok(payload) => normalize_entries(&payload),
            Err(e) => {
                tracing::warn!(
                    "[workspace] Failed to list {} files for agent {}: {}",
                    category,
                    agent_id,
                    e
                );
                return Vec::new();
            }
        };

        let mut files = index_entries(category, agent_id, &entries);
        sort_newest_first(&mut files);
        files
    }

    /// 读取文件内容
    pub async fn read_file(&self, file: &WorkspaceFile) -> String {
        self.read_file_at(&file.path, &file.agent_id).await
    }

    /// 按路径读取文件内容
    pub async fn read_file_at(&self, path: &str, agent_id: &str) -> String {
        let request = Request::ReadFile {
            path: path.to_string(),
            agent_id: agent_id.to_string(),
        };

        match self.gateway.request(&request).await {
            Ok(payload) => normalize_read_content(&payload).unwrap_or_else(|| NO_CONTENT.to_string()),
            Err(e) => {
                tracing::warn!("[workspace] Failed to read {} (agent {}): {}", path, agent_id, e);
                FAILED_TO_LOAD.to_string()
            }
        }
    }

    // ==================== Chat ====================

    /// 默认会话的对话
    pub fn chat(&self) -> ChatSession<G> {
        ChatSession::from_config(self.gateway.clone(), &self.config)
    }

    /// 指定会话的对话
    pub fn chat_with(&self, session_key: &str) -> ChatSession<G> {
        ChatSession::from_config(self.gateway.clone(), &self.config.clone().with_session_key(session_key))
    }
}
