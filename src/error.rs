//! 错误类型
//!
//! `RouteError` 覆盖运行期的路由/协议错误；`ConfigError` 覆盖运行参数问题。

use thiserror::Error;

use crate::net::NodeId;

/// 运行期错误。除 `NoRouteToDestination` 外均为致命错误。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("node {node}: unsupported message kind `{kind}`")]
    UnsupportedMessageKind { node: NodeId, kind: &'static str },

    #[error("node {node}: unknown edge {from} -> {to}")]
    UnknownEdge {
        node: NodeId,
        from: NodeId,
        to: NodeId,
    },

    #[error("node {node}: no pending reward for package #{pkg_id}")]
    UnknownPendingPackage { node: NodeId, pkg_id: u64 },

    #[error("node {node}: no route to destination {destination}")]
    NoRouteToDestination { node: NodeId, destination: NodeId },

    #[error("node {node}: next hop {next} is not an out-neighbor")]
    InvalidNextHop { node: NodeId, next: NodeId },

    #[error("node {node}: no out-neighbor to route through")]
    NoOutNeighbors { node: NodeId },

    #[error("node {node} does not exist")]
    UnknownNode { node: NodeId },

    #[error("node {node}: no delayed message with id {delay_id}")]
    UnknownDelay { node: NodeId, delay_id: u64 },
}

impl RouteError {
    /// 暂时性错误：丢弃当前数据包即可，仿真继续。
    pub fn is_transient(&self) -> bool {
        matches!(self, RouteError::NoRouteToDestination { .. })
    }
}

/// 运行参数错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported router type `{0}` (expected link_state or simple_q)")]
    UnsupportedRouterType(String),

    #[error("network description has no edges")]
    EmptyNetwork,

    #[error("edge {u} <-> {v} has zero bandwidth")]
    ZeroBandwidth { u: usize, v: usize },

    #[error("edge {node} <-> {node} is a self-loop")]
    SelfLoop { node: usize },

    #[error("node {node} is not part of the network")]
    UnknownNode { node: usize },

    #[error("edge {u} <-> {v} is listed more than once")]
    DuplicateLink { u: usize, v: usize },

    #[error("no edge between {u} and {v}")]
    UnknownLink { u: usize, v: usize },

    #[error("source/destination list is empty")]
    EmptyNodeList,

    #[error("invalid run parameters: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
