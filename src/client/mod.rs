//! Gateway Client 模块
//!
//! 提供基于 HTTP 的 [`Gateway`](crate::gateway::Gateway) 实现

mod http;

pub use http::HttpGateway;
