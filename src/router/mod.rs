//! 路由器（节点上的消息处理状态机）
//!
//! 所有路由器共享同一个分发逻辑 [`Router::handle`]：数据包要么在本地交付，
//! 要么交给具体协议的 [`Router::route`] 选出下一跳；服务消息交给
//! [`Router::handle_service_msg`]；拓扑变化先更新本地视图再通知
//! [`Router::on_link_changed`]。协议状态由可组合的能力对象承担
//! （[`Topology`]、[`RewardTracker`]、[`LinkStateDb`]）。

mod kind;
mod link_state;
mod policy;
mod q_router;
mod reward;
mod topology;

pub use kind::RouterKind;
pub use link_state::{Announcement, LinkStateDb, LinkStateRouter};
pub use policy::{PolicyRouter, RoutePolicy};
pub use q_router::QRouter;
pub use reward::RewardTracker;
pub use topology::Topology;

use tracing::{debug, trace};

use crate::error::RouteError;
use crate::net::{Direction, EdgeData, Message, NodeId, Package, ServiceMsg};
use crate::sim::SimTime;

/// 本地拓扑变化（已应用到路由器的拓扑视图之后才通知）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkChange {
    Added {
        node: NodeId,
        direction: Direction,
        edge: EdgeData,
    },
    Removed {
        node: NodeId,
        direction: Direction,
    },
}

/// 路由器接口
pub trait Router: Send {
    /// 获取节点标识符
    fn id(&self) -> NodeId;

    /// 协议名称（用于日志）
    fn name(&self) -> &'static str;

    /// 向下转型到具体路由器类型
    fn as_any(&self) -> &dyn std::any::Any;

    fn topology(&self) -> &Topology;

    fn topology_mut(&mut self) -> &mut Topology;

    /// 网络构建完成后的初始化
    fn init(
        &mut self,
        _now: SimTime,
        _config: &serde_json::Value,
    ) -> Result<Vec<Message>, RouteError> {
        Ok(Vec::new())
    }

    /// 为不以本节点为目的地的数据包选择下一跳（必须是当前出边邻居），
    /// 并返回随之发出的附带消息。`sender == None` 表示数据包在本节点注入。
    fn route(
        &mut self,
        now: SimTime,
        sender: Option<NodeId>,
        pkg: &Package,
    ) -> Result<(NodeId, Vec<Message>), RouteError>;

    fn handle_service_msg(
        &mut self,
        _now: SimTime,
        _sender: NodeId,
        msg: &ServiceMsg,
    ) -> Result<Vec<Message>, RouteError> {
        Err(RouteError::UnsupportedMessageKind {
            node: self.id(),
            kind: msg.kind(),
        })
    }

    fn on_link_changed(
        &mut self,
        _now: SimTime,
        _change: LinkChange,
    ) -> Result<Vec<Message>, RouteError> {
        Ok(Vec::new())
    }

    /// 当前出边邻居（升序）
    fn out_neighbors(&self) -> Vec<NodeId> {
        self.topology().out_neighbors(self.id())
    }

    /// 处理一条消息，按因果顺序返回发出的消息。
    #[tracing::instrument(skip(self, msg), fields(node = %self.id(), router = self.name(), kind = msg.kind()))]
    fn handle(&mut self, now: SimTime, msg: Message) -> Result<Vec<Message>, RouteError> {
        let id = self.id();
        match msg {
            Message::In { from, inner, .. } => match *inner {
                Message::Pkg { pkg } => {
                    if pkg.destination == id {
                        debug!(pkg_id = pkg.id, "📦 数据包到达目的地");
                        return Ok(vec![Message::PkgReceived { pkg }]);
                    }

                    let (next, extra) = self.route(now, from, &pkg)?;
                    if !self.topology().has_edge(id, next) {
                        return Err(RouteError::InvalidNextHop { node: id, next });
                    }
                    trace!(pkg_id = pkg.id, next = %next, extra = extra.len(), "选定下一跳");

                    let mut resp = Vec::with_capacity(extra.len() + 1);
                    resp.push(Message::outgoing(id, next, Message::pkg(pkg)));
                    resp.extend(extra);
                    Ok(resp)
                }
                Message::Service { msg } => match from {
                    Some(sender) => self.handle_service_msg(now, sender, &msg),
                    None => Err(RouteError::UnsupportedMessageKind {
                        node: id,
                        kind: msg.kind(),
                    }),
                },
                other => Err(RouteError::UnsupportedMessageKind {
                    node: id,
                    kind: other.kind(),
                }),
            },
            Message::Init { config } => self.init(now, &config),
            Message::AddLink {
                node,
                direction,
                edge,
            } => {
                if direction.includes_out() && !self.topology_mut().add_edge(id, node, edge) {
                    trace!(to = %node, "边已存在，忽略");
                }
                self.on_link_changed(
                    now,
                    LinkChange::Added {
                        node,
                        direction,
                        edge,
                    },
                )
            }
            Message::RemoveLink { node, direction } => {
                if direction.includes_out() && self.topology_mut().remove_edge(id, node).is_none() {
                    return Err(RouteError::UnknownEdge {
                        node: id,
                        from: id,
                        to: node,
                    });
                }
                self.on_link_changed(now, LinkChange::Removed { node, direction })
            }
            other => Err(RouteError::UnsupportedMessageKind {
                node: id,
                kind: other.kind(),
            }),
        }
    }
}
