//! 链路状态路由
//!
//! 每个节点在初始化和本地拓扑变化时泛洪自己的出边状态（带递增序列号）；
//! 收到更新的通告后整体替换该节点在本地视图中的出边，并转发给除发送方以外的
//! 出边邻居。转发时在本地视图上取最短路径的第二个节点作为下一跳。

use std::collections::HashMap;

use tracing::{debug, trace};

use super::topology::Topology;
use super::{LinkChange, Router};
use crate::error::RouteError;
use crate::net::{Message, NeighborState, NodeId, Package, ServiceMsg};
use crate::sim::SimTime;

/// 最近一次接受的通告
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub seq: u64,
    pub state: NeighborState,
}

/// 链路状态数据库：序列号与各节点的最新通告。可被其他路由器复用。
#[derive(Debug, Clone)]
pub struct LinkStateDb {
    node: NodeId,
    seq_num: u64,
    announcements: HashMap<NodeId, Announcement>,
}

impl LinkStateDb {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            seq_num: 0,
            announcements: HashMap::new(),
        }
    }

    pub fn seq_num(&self) -> u64 {
        self.seq_num
    }

    pub fn announcement(&self, node: NodeId) -> Option<&Announcement> {
        self.announcements.get(&node)
    }

    pub fn known_nodes(&self) -> usize {
        self.announcements.len()
    }

    /// 递增序列号并向所有出边邻居泛洪本节点当前的出边状态。
    ///
    /// 自己的通告也记入数据库，这样绕环回来的旧通告会被当作过期丢弃。
    pub fn announce(&mut self, topology: &Topology) -> Vec<Message> {
        self.seq_num += 1;
        let state = topology.out_edges(self.node);
        self.announcements.insert(
            self.node,
            Announcement {
                seq: self.seq_num,
                state: state.clone(),
            },
        );
        debug!(node = %self.node, seq = self.seq_num, edges = state.len(), "📣 泛洪链路状态");

        let announce = ServiceMsg::StateAnnounce {
            node: self.node,
            seq: self.seq_num,
            state,
        };
        topology
            .out_neighbors(self.node)
            .into_iter()
            .map(|nbr| Message::outgoing(self.node, nbr, Message::service(announce.clone())))
            .collect()
    }

    /// 处理来自 `sender` 的通告。被接受时更新 `topology` 并返回需要转发的消息；
    /// 过期或重复的通告返回 None。
    pub fn process(
        &mut self,
        topology: &mut Topology,
        sender: NodeId,
        node: NodeId,
        seq: u64,
        state: &NeighborState,
    ) -> Option<Vec<Message>> {
        let fresh = match self.announcements.get(&node) {
            Some(prev) => seq > prev.seq,
            None => node != self.node,
        };
        if !fresh {
            trace!(node = %self.node, origin = %node, seq, "丢弃过期通告");
            return None;
        }

        topology.replace_out_edges(node, state);
        self.announcements.insert(
            node,
            Announcement {
                seq,
                state: state.clone(),
            },
        );
        trace!(node = %self.node, origin = %node, seq, "接受通告");

        let announce = ServiceMsg::StateAnnounce {
            node,
            seq,
            state: state.clone(),
        };
        let flood = topology
            .out_neighbors(self.node)
            .into_iter()
            .filter(|&nbr| nbr != sender)
            .map(|nbr| Message::outgoing(self.node, nbr, Message::service(announce.clone())))
            .collect();
        Some(flood)
    }
}

/// 链路状态路由器
#[derive(Debug, Clone)]
pub struct LinkStateRouter {
    id: NodeId,
    topology: Topology,
    db: LinkStateDb,
}

impl LinkStateRouter {
    pub fn new(id: NodeId, topology: Topology) -> Self {
        Self {
            id,
            topology,
            db: LinkStateDb::new(id),
        }
    }

    pub fn db(&self) -> &LinkStateDb {
        &self.db
    }
}

impl Router for LinkStateRouter {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &'static str {
        "link_state"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    fn init(
        &mut self,
        _now: SimTime,
        _config: &serde_json::Value,
    ) -> Result<Vec<Message>, RouteError> {
        Ok(self.db.announce(&self.topology))
    }

    fn route(
        &mut self,
        _now: SimTime,
        _sender: Option<NodeId>,
        pkg: &Package,
    ) -> Result<(NodeId, Vec<Message>), RouteError> {
        let no_route = RouteError::NoRouteToDestination {
            node: self.id,
            destination: pkg.destination,
        };
        let path = self
            .topology
            .shortest_path(self.id, pkg.destination)
            .ok_or_else(|| no_route.clone())?;
        let next = path.get(1).copied().ok_or(no_route)?;
        Ok((next, Vec::new()))
    }

    fn handle_service_msg(
        &mut self,
        _now: SimTime,
        sender: NodeId,
        msg: &ServiceMsg,
    ) -> Result<Vec<Message>, RouteError> {
        match msg {
            ServiceMsg::StateAnnounce { node, seq, state } => {
                Ok(self
                    .db
                    .process(&mut self.topology, sender, *node, *seq, state)
                    .unwrap_or_default())
            }
            other => Err(RouteError::UnsupportedMessageKind {
                node: self.id,
                kind: other.kind(),
            }),
        }
    }

    fn on_link_changed(
        &mut self,
        _now: SimTime,
        _change: LinkChange,
    ) -> Result<Vec<Message>, RouteError> {
        Ok(self.db.announce(&self.topology))
    }
}
