//! 工作区文件索引
//!
//! 把 `list_directory` 的原始条目转换为 [`WorkspaceFile`]，
//! 并提供按日期倒序的展示顺序。

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::normalize::value_to_string;
use crate::types::{FileCategory, WorkspaceFile};

/// 读取失败时展示的文案
pub const FAILED_TO_LOAD: &str = "Failed to load file content.";

/// 文件没有可用内容时展示的文案
pub const NO_CONTENT: &str = "No content available.";

/// 文件名中的日期，如 `17-02-2026.md`
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}-\d{2}-\d{4})").expect("valid date regex"));

/// 提取日期 key：第一个 `DD-MM-YYYY`，没有则用文件名本身
pub fn extract_date_key(name: &str) -> String {
    DATE_PATTERN
        .find(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| name.to_string())
}

/// 将目录条目转换为工作区文件
pub fn index_entries(category: FileCategory, agent_id: &str, entries: &[Value]) -> Vec<WorkspaceFile> {
    entries
        .iter()
        .map(|entry| index_entry(category, agent_id, entry))
        .collect()
}

fn index_entry(category: FileCategory, agent_id: &str, entry: &Value) -> WorkspaceFile {
    let name = match entry {
        Value::String(s) => s.clone(),
        other => other
            .get("name")
            .filter(|n| !n.is_null())
            .map(value_to_string)
            .unwrap_or_else(|| other.to_string()),
    };

    let path = match entry.get("path") {
        Some(p) if !p.is_null() => value_to_string(p),
        _ => format!("{}/{}", category.as_str(), name),
    };

    let date = extract_date_key(&name);

    WorkspaceFile {
        name,
        path,
        date,
        agent_id: agent_id.to_string(),
    }
}

/// 按日期 key 倒序（最新在前）
///
/// 稳定排序，日期相同的文件保持原有顺序。
pub fn sort_newest_first(files: &mut [WorkspaceFile]) {
    files.sort_by(|a, b| b.date.cmp(&a.date));
}

/// 卡片标题：去掉 `.md`
pub fn display_title(file: &WorkspaceFile) -> String {
    file.name.replacen(".md", "", 1)
}
