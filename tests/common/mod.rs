//! 测试用的脚本化 Gateway

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use agent_dashboard_core::{Error, Gateway, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

/// 按工具名返回预设响应，可注入失败和阻塞
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置工具响应
    pub fn respond(&self, tool: &str, value: Value) {
        self.responses.lock().insert(tool.to_string(), value);
        self.failures.lock().remove(tool);
    }

    /// 让工具调用失败
    pub fn fail(&self, tool: &str) {
        self.failures.lock().insert(tool.to_string());
    }

    /// 阻塞工具调用，直到返回的 Notify 被触发
    pub fn hold(&self, tool: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(tool.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self, tool: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(t, _)| t == tool)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn call_count(&self, tool: &str) -> usize {
        self.calls(tool).len()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn invoke(&self, tool: &str, args: Value) -> Result<Value> {
        self.calls.lock().push((tool.to_string(), args));

        let gate = self.gates.lock().get(tool).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failures.lock().contains(tool) {
            return Err(Error::gateway(tool, "scripted failure"));
        }

        Ok(self.responses.lock().get(tool).cloned().unwrap_or(Value::Null))
    }
}
