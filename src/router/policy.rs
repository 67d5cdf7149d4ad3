//! Routing driven by an external policy.
//!
//! The policy (for instance a learned model) is a black box that picks a
//! neighbor and reports its value estimate. The router around it keeps the
//! topology in sync by link-state flooding and feeds reward observations
//! back to the policy.

use tracing::trace;

use super::link_state::LinkStateDb;
use super::reward::RewardTracker;
use super::topology::Topology;
use super::{LinkChange, Router};
use crate::error::RouteError;
use crate::net::{Message, NodeId, Package, ServiceMsg};
use crate::sim::SimTime;

pub trait RoutePolicy: Send + 'static {
    /// Pick one of `neighbors` (ascending ids, never empty) for a package
    /// bound for `destination`, with the estimated remaining delivery time.
    fn choose(&mut self, node: NodeId, destination: NodeId, neighbors: &[NodeId]) -> (NodeId, f64);

    /// Observed cost of sending a package for `destination` through `neighbor`.
    fn observe(&mut self, _node: NodeId, _destination: NodeId, _neighbor: NodeId, _observed: f64) {}

    /// The local topology view changed.
    fn topology_changed(&mut self, _node: NodeId, _topology: &Topology) {}
}

pub struct PolicyRouter<P> {
    id: NodeId,
    topology: Topology,
    db: LinkStateDb,
    rewards: RewardTracker<NodeId>,
    policy: P,
}

impl<P: RoutePolicy> PolicyRouter<P> {
    pub fn new(id: NodeId, topology: Topology, policy: P) -> Self {
        Self {
            id,
            topology,
            db: LinkStateDb::new(id),
            rewards: RewardTracker::new(id),
            policy,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn db(&self) -> &LinkStateDb {
        &self.db
    }

    fn announce(&mut self) -> Vec<Message> {
        let msgs = self.db.announce(&self.topology);
        self.policy.topology_changed(self.id, &self.topology);
        msgs
    }
}

impl<P: RoutePolicy> Router for PolicyRouter<P> {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &'static str {
        "policy"
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
        Ok(self.announce())
    }

    fn route(
        &mut self,
        now: SimTime,
        sender: Option<NodeId>,
        pkg: &Package,
    ) -> Result<(NodeId, Vec<Message>), RouteError> {
        let neighbors = self.topology.out_neighbors(self.id);
        if neighbors.is_empty() {
            return Err(RouteError::NoOutNeighbors { node: self.id });
        }

        let (next, estimate) = self.policy.choose(self.id, pkg.destination, &neighbors);
        if !neighbors.contains(&next) {
            return Err(RouteError::InvalidNextHop {
                node: self.id,
                next,
            });
        }
        trace!(node = %self.id, pkg_id = pkg.id, next = %next, estimate, "policy choice");

        let reward = self
            .rewards
            .register_pending(pkg, estimate, pkg.destination, now);
        let resp = sender
            .map(|s| Message::outgoing(self.id, s, Message::service(reward)))
            .into_iter()
            .collect();
        Ok((next, resp))
    }

    fn handle_service_msg(
        &mut self,
        _now: SimTime,
        sender: NodeId,
        msg: &ServiceMsg,
    ) -> Result<Vec<Message>, RouteError> {
        match msg {
            ServiceMsg::StateAnnounce { node, seq, state } => {
                match self
                    .db
                    .process(&mut self.topology, sender, *node, *seq, state)
                {
                    Some(flood) => {
                        self.policy.topology_changed(self.id, &self.topology);
                        Ok(flood)
                    }
                    None => Ok(Vec::new()),
                }
            }
            ServiceMsg::Reward {
                pkg_id,
                estimate,
                sent_at,
            } => {
                let (observed, destination) = self.rewards.resolve(*pkg_id, *estimate, *sent_at)?;
                self.policy.observe(self.id, destination, sender, observed);
                Ok(Vec::new())
            }
        }
    }

    fn on_link_changed(
        &mut self,
        _now: SimTime,
        _change: LinkChange,
    ) -> Result<Vec<Message>, RouteError> {
        Ok(self.announce())
    }
}
