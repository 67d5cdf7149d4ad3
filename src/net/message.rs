//! Messages exchanged between nodes and inside a node's own pipeline.
//!
//! `Package` is the unit whose delivery is measured; everything else is
//! control plane (`ServiceMsg`), topology churn, or pipeline plumbing
//! (`In`/`Out` transfer wrappers, delayed messages).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::NodeId;
use crate::sim::SimTime;

/// Attributes of a directed edge as seen by a router.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Bytes per virtual-time unit.
    pub bandwidth: u64,
    /// Path cost used by shortest-path forwarding.
    pub weight: f64,
}

impl EdgeData {
    /// Weight is the inverse bandwidth, so faster links are cheaper.
    pub fn from_bandwidth(bandwidth: u64) -> Self {
        let weight = if bandwidth == 0 {
            f64::INFINITY
        } else {
            1.0 / bandwidth as f64
        };
        Self { bandwidth, weight }
    }
}

/// Out-edges of one node, keyed by neighbor.
pub type NeighborState = BTreeMap<NodeId, EdgeData>;

/// Which edges of a link a topology update refers to, from the receiving
/// node's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
    #[default]
    Both,
}

impl Direction {
    pub fn includes_out(self) -> bool {
        !matches!(self, Direction::In)
    }
}

/// A package whose delivery is studied. Equality and ordering use `id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: u64,
    pub size: u32,
    pub destination: NodeId,
    pub start_time: SimTime,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Package {
    pub fn new(id: u64, size: u32, destination: NodeId, start_time: SimTime) -> Self {
        Self {
            id,
            size,
            destination,
            start_time,
            payload: serde_json::Value::Null,
        }
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Package {}

impl PartialOrd for Package {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Package {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// Control-plane messages. They never occupy a link or a processing slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum ServiceMsg {
    /// Link-state announcement of `node`'s out-edges.
    StateAnnounce {
        node: NodeId,
        seq: u64,
        state: NeighborState,
    },
    /// Feedback for the upstream hop of package `pkg_id`.
    Reward {
        pkg_id: u64,
        estimate: f64,
        sent_at: SimTime,
    },
}

impl ServiceMsg {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceMsg::StateAnnounce { .. } => "state_announce",
            ServiceMsg::Reward { .. } => "reward",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Init {
        #[serde(default)]
        config: serde_json::Value,
    },
    Pkg {
        pkg: Package,
    },
    /// Message arriving at `to`; `from == None` marks a package injected at
    /// its source.
    In {
        from: Option<NodeId>,
        to: NodeId,
        inner: Box<Message>,
    },
    /// Message leaving `from` toward neighbor `to`.
    Out {
        from: NodeId,
        to: NodeId,
        inner: Box<Message>,
    },
    Service {
        msg: ServiceMsg,
    },
    AddLink {
        node: NodeId,
        #[serde(default)]
        direction: Direction,
        edge: EdgeData,
    },
    RemoveLink {
        node: NodeId,
        #[serde(default)]
        direction: Direction,
    },
    /// Emit `inner` after `delay` unless interrupted first.
    Delayed {
        id: u64,
        delay: SimTime,
        inner: Box<Message>,
    },
    InterruptDelay {
        delay_id: u64,
    },
    PkgReceived {
        pkg: Package,
    },
}

impl Message {
    pub fn init() -> Self {
        Message::Init {
            config: serde_json::Value::Null,
        }
    }

    pub fn pkg(pkg: Package) -> Self {
        Message::Pkg { pkg }
    }

    pub fn service(msg: ServiceMsg) -> Self {
        Message::Service { msg }
    }

    pub fn incoming(from: Option<NodeId>, to: NodeId, inner: Message) -> Self {
        Message::In {
            from,
            to,
            inner: Box::new(inner),
        }
    }

    pub fn outgoing(from: NodeId, to: NodeId, inner: Message) -> Self {
        Message::Out {
            from,
            to,
            inner: Box::new(inner),
        }
    }

    pub fn delayed(id: u64, delay: SimTime, inner: Message) -> Self {
        Message::Delayed {
            id,
            delay,
            inner: Box::new(inner),
        }
    }

    /// Short name of the variant, used in errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Init { .. } => "init",
            Message::Pkg { .. } => "pkg",
            Message::In { .. } => "in",
            Message::Out { .. } => "out",
            Message::Service { .. } => "service",
            Message::AddLink { .. } => "add_link",
            Message::RemoveLink { .. } => "remove_link",
            Message::Delayed { .. } => "delayed",
            Message::InterruptDelay { .. } => "interrupt_delay",
            Message::PkgReceived { .. } => "pkg_received",
        }
    }
}
