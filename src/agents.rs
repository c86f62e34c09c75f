//! Agent 视图投影
//!
//! Agent 卡片的绑定标签、渠道连接图。

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{Agent, Binding};

/// 没有指定渠道的绑定显示为 `any`
pub const ANY_CHANNEL: &str = "any";

/// 绑定标签
pub fn binding_label(binding: &Binding) -> &str {
    binding.match_channel.as_deref().unwrap_or(ANY_CHANNEL)
}

/// Agent 的全部绑定标签（保持顺序）
pub fn binding_labels(agent: &Agent) -> Vec<&str> {
    agent.bindings.iter().map(binding_label).collect()
}

/// 标记为默认的 Agent
///
/// 上游约定最多一个，但这里不做纠正，多个时全部返回。
pub fn default_agents(agents: &[Agent]) -> Vec<&Agent> {
    agents.iter().filter(|a| a.is_default).collect()
}

/// 渠道连接
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelLink {
    pub channel: String,
    pub agent_ids: Vec<String>,
}

/// 渠道 → Agent 连接图（按渠道名排序，Agent 去重并保持出现顺序）
pub fn channel_links(agents: &[Agent]) -> Vec<ChannelLink> {
    let mut links: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for agent in agents {
        for binding in &agent.bindings {
            let target = binding.agent_id.as_deref().unwrap_or(&agent.id);
            let ids = links.entry(binding_label(binding)).or_default();
            if !ids.iter().any(|id| id == target) {
                ids.push(target.to_string());
            }
        }
    }

    links
        .into_iter()
        .map(|(channel, agent_ids)| ChannelLink {
            channel: channel.to_string(),
            agent_ids,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, channels: &[Option<&str>]) -> Agent {
        let mut agent = Agent::with_id(id);
        agent.bindings = channels
            .iter()
            .map(|c| Binding {
                agent_id: None,
                match_channel: c.map(str::to_string),
            })
            .collect();
        agent
    }

    #[test]
    fn test_binding_labels() {
        let a = agent("main", &[Some("telegram"), None]);
        assert_eq!(binding_labels(&a), vec!["telegram", "any"]);
    }

    #[test]
    fn test_default_agents_not_reconciled() {
        let mut a = agent("a", &[]);
        let mut b = agent("b", &[]);
        let c = agent("c", &[]);
        a.is_default = true;
        b.is_default = true;

        let agents = vec![a, b, c];
        let defaults = default_agents(&agents);
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults[0].id, "a");
    }

    #[test]
    fn test_channel_links() {
        let mut ops = agent("ops", &[Some("slack"), Some("telegram")]);
        ops.bindings.push(Binding {
            agent_id: Some("main".to_string()),
            match_channel: Some("slack".to_string()),
        });
        let agents = vec![agent("main", &[Some("telegram"), None]), ops];

        let links = channel_links(&agents);
        assert_eq!(
            links,
            vec![
                ChannelLink { channel: "any".to_string(), agent_ids: vec!["main".to_string()] },
                ChannelLink {
                    channel: "slack".to_string(),
                    agent_ids: vec!["ops".to_string(), "main".to_string()],
                },
                ChannelLink {
                    channel: "telegram".to_string(),
                    agent_ids: vec!["main".to_string(), "ops".to_string()],
                },
            ]
        );
    }
}
