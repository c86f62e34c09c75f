//! 错误类型定义

use thiserror::Error;

/// 库错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP 传输错误
    #[cfg(feature = "client")]
    #[error("HTTP 错误: {0}")]
    Http(#[from] reqwest::Error),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Gateway 返回的失败结果
    #[error("Gateway 调用失败 ({tool}): {message}")]
    Gateway { tool: String, message: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 非法的文件分类
    #[error("type must be 'report' or 'feedback' (got {0:?})")]
    InvalidCategory(String),

    /// 其他错误
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// 构造 Gateway 错误
    pub fn gateway(tool: &str, message: impl Into<String>) -> Self {
        Error::Gateway {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;
