//! 会话对话驱动
//!
//! 把 [`ConversationStore`] 和 Gateway 连接起来：
//! - `refresh()`：拉取历史并整体替换日志
//! - `send()`：乐观追加 → 调用 `sessions_send` → 失败回滚
//! - `start_polling()`：固定间隔轮询，句柄释放即停止
//!
//! 轮询和发送互不同步，正确性依赖于日志的原子操作
//! （整体替换 / 追加 / 按 ID 移除）。

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::{GatewayConfig, DEFAULT_HISTORY_LIMIT, DEFAULT_POLL_INTERVAL_MS};
use crate::gateway::Gateway;
use crate::normalize::{decode_listing, messages_from_listing, normalize_send_ack, MESSAGE_FIELDS};
use crate::protocol::Request;
use crate::store::{ConversationStore, PendingSend};
use crate::tasks::now_ms;

/// 发送结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// 文本为空或已有发送中的消息，什么都没做
    Skipped,
    /// Gateway 已确认
    Delivered,
    /// 发送失败，临时消息已移除
    RolledBack,
}

/// 单个会话的对话驱动
pub struct ChatSession<G: Gateway + 'static> {
    gateway: Arc<G>,
    store: Arc<ConversationStore>,
    history_limit: u32,
    poll_interval: Duration,
}

impl<G: Gateway + 'static> ChatSession<G> {
    /// 创建对话（默认拉取 50 条，3 秒轮询）
    pub fn new(gateway: Arc<G>, session_key: &str) -> Self {
        Self {
            gateway,
            store: Arc::new(ConversationStore::new(session_key)),
            history_limit: DEFAULT_HISTORY_LIMIT,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// 使用配置中的会话 key、条数和轮询间隔
    pub fn from_config(gateway: Arc<G>, config: &GatewayConfig) -> Self {
        Self::new(gateway, &config.session_key)
            .with_history_limit(config.history_limit)
            .with_poll_interval(config.poll_interval())
    }

    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn session_key(&self) -> &str {
        self.store.session_key()
    }

    /// 拉取历史并替换日志
    ///
    /// 返回是否替换成功。失败时保留原日志，等下一次轮询重试。
    pub async fn refresh(&self) -> bool {
        refresh_store(self.gateway.as_ref(), &self.store, self.history_limit).await
    }

    /// 发送消息（等待 Gateway 结果）
    pub async fn send(&self, text: &str) -> SendOutcome {
        match self.store.begin_send(text, now_ms()) {
            Some(pending) => {
                deliver(
                    self.gateway.as_ref(),
                    Arc::downgrade(&self.store),
                    self.session_key().to_string(),
                    pending,
                )
                .await
            }
            None => SendOutcome::Skipped,
        }
    }

    /// 发送输入框中的内容
    pub async fn submit(&self) -> SendOutcome {
        match self.store.submit_input(now_ms()) {
            Some(pending) => {
                deliver(
                    self.gateway.as_ref(),
                    Arc::downgrade(&self.store),
                    self.session_key().to_string(),
                    pending,
                )
                .await
            }
            None => SendOutcome::Skipped,
        }
    }

    /// 后台发送
    ///
    /// 只持有日志的弱引用：对话关闭后发送仍会完成，但结果被丢弃。
    pub fn spawn_send(&self, text: &str) -> Option<JoinHandle<SendOutcome>> {
        let pending = self.store.begin_send(text, now_ms())?;
        let gateway = self.gateway.clone();
        let store = Arc::downgrade(&self.store);
        let session_key = self.session_key().to_string();

        Some(tokio::spawn(async move {
            deliver(gateway.as_ref(), store, session_key, pending).await
        }))
    }

    /// 启动轮询（立即拉取一次，之后按固定间隔）
    pub fn start_polling(&self) -> PollHandle {
        let gateway = self.gateway.clone();
        let store = Arc::downgrade(&self.store);
        let limit = self.history_limit;
        let period = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    tracing::info!("🛑 Store dropped, poller exiting");
                    break;
                };
                refresh_store(gateway.as_ref(), &store, limit).await;
            }
        });

        tracing::info!(
            "🔄 Polling started: session_key={}, interval={:?}",
            self.session_key(),
            period
        );
        PollHandle { task: Some(task) }
    }
}

/// 轮询句柄，`stop()` 或释放时停止轮询
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn refresh_store<G: Gateway + ?Sized>(
    gateway: &G,
    store: &ConversationStore,
    limit: u32,
) -> bool {
    let request = Request::SessionsHistory {
        session_key: store.session_key().to_string(),
        limit,
    };

    let refreshed = match gateway.request(&request).await {
        Ok(payload) => {
            let listing = decode_listing(&payload, MESSAGE_FIELDS);
            if listing.is_known() {
                store.replace(messages_from_listing(&listing));
                true
            } else {
                tracing::warn!(
                    "Unrecognized history payload, keeping current log: session_key={}",
                    store.session_key()
                );
                false
            }
        }
        Err(e) => {
            tracing::warn!("Failed to fetch history, will retry on next poll: {}", e);
            false
        }
    };

    store.mark_loaded();
    refreshed
}

async fn deliver<G: Gateway + ?Sized>(
    gateway: &G,
    store: Weak<ConversationStore>,
    session_key: String,
    pending: PendingSend,
) -> SendOutcome {
    let request = Request::SessionsSend {
        session_key,
        message: pending.text.clone(),
    };

    let accepted = match gateway.request(&request).await {
        Ok(payload) => {
            let ack = normalize_send_ack(&payload);
            if !ack.ok {
                tracing::warn!("Gateway rejected message, rolling back: id={}", pending.id);
            }
            ack.ok
        }
        Err(e) => {
            tracing::warn!("Failed to send message, rolling back: id={}, error={}", pending.id, e);
            false
        }
    };

    match store.upgrade() {
        Some(store) => store.finish_send(pending.id, accepted),
        None => tracing::debug!("Store dropped before send completed: id={}", pending.id),
    }

    if accepted {
        SendOutcome::Delivered
    } else {
        SendOutcome::RolledBack
    }
}
