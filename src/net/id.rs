//! 标识符类型
//!
//! 定义节点和链路的唯一标识符。节点 id 同时用作节点表下标。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// 链路标识符（有向链路表下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub usize);
