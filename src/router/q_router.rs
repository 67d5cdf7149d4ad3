//! Tabular Q-routing.
//!
//! `value[d][y]` estimates the remaining delivery time of a package bound for
//! `d` when handed to neighbor `y`. Rows are created lazily; new
//! out-neighbors extend every row, vanished neighbors stay in the table but
//! are not eligible for selection.

use std::collections::BTreeMap;

use tracing::trace;

use super::reward::RewardTracker;
use super::topology::Topology;
use super::{LinkChange, Router};
use crate::error::RouteError;
use crate::net::{Message, NodeId, Package, ServiceMsg};
use crate::sim::{QRouterSettings, SimTime};

#[derive(Debug, Clone)]
pub struct QRouter {
    id: NodeId,
    topology: Topology,
    rewards: RewardTracker<NodeId>,
    q: BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
    learning_rate: f64,
    initial_estimate: f64,
}

impl QRouter {
    pub fn new(id: NodeId, topology: Topology, settings: QRouterSettings) -> Self {
        let mut router = Self {
            id,
            topology,
            rewards: RewardTracker::new(id),
            q: BTreeMap::new(),
            learning_rate: settings.learning_rate,
            initial_estimate: settings.initial_estimate,
        };
        let mut known = router.topology.in_neighbors(id);
        known.extend(router.topology.out_neighbors(id));
        for d in known {
            router.ensure_destination(d);
        }
        router
    }

    pub fn value(&self, destination: NodeId, neighbor: NodeId) -> Option<f64> {
        self.q.get(&destination)?.get(&neighbor).copied()
    }

    /// Row for `destination` restricted to the current out-neighbors.
    pub fn active_values(&self, destination: NodeId) -> Vec<(NodeId, f64)> {
        let Some(row) = self.q.get(&destination) else {
            return Vec::new();
        };
        self.topology
            .out_neighbors(self.id)
            .into_iter()
            .filter_map(|y| row.get(&y).map(|&v| (y, v)))
            .collect()
    }

    pub fn destinations(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.q.keys().copied()
    }

    /// Pending rewards. The entry for a package handed straight to its
    /// destination is never resolved, since the destination does not route
    /// it and sends no reward back; such entries stay for the whole run.
    pub fn rewards(&self) -> &RewardTracker<NodeId> {
        &self.rewards
    }

    fn default_value(&self, destination: NodeId, neighbor: NodeId) -> f64 {
        if destination == neighbor {
            0.0
        } else {
            self.initial_estimate
        }
    }

    fn ensure_destination(&mut self, destination: NodeId) {
        if self.q.contains_key(&destination) {
            return;
        }
        let row = self
            .topology
            .out_neighbors(self.id)
            .into_iter()
            .map(|y| (y, self.default_value(destination, y)))
            .collect();
        self.q.insert(destination, row);
    }

    fn ensure_neighbor(&mut self, neighbor: NodeId) {
        let initial = self.initial_estimate;
        for (&d, row) in self.q.iter_mut() {
            row.entry(neighbor)
                .or_insert(if d == neighbor { 0.0 } else { initial });
        }
    }
}

impl Router for QRouter {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &'static str {
        "simple_q"
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

    fn route(
        &mut self,
        now: SimTime,
        sender: Option<NodeId>,
        pkg: &Package,
    ) -> Result<(NodeId, Vec<Message>), RouteError> {
        let d = pkg.destination;
        let neighbors = self.topology.out_neighbors(self.id);
        if neighbors.is_empty() {
            return Err(RouteError::NoOutNeighbors { node: self.id });
        }
        self.ensure_destination(d);
        for &y in &neighbors {
            if self.value(d, y).is_none() {
                self.ensure_neighbor(y);
            }
        }

        // first minimum in ascending neighbor order wins
        let mut best: Option<(NodeId, f64)> = None;
        for (y, v) in self.active_values(d) {
            if best.is_none_or(|(_, b)| v < b) {
                best = Some((y, v));
            }
        }
        let (next, estimate) = best.ok_or(RouteError::NoOutNeighbors { node: self.id })?;
        trace!(node = %self.id, pkg_id = pkg.id, next = %next, estimate, "Q-routing choice");

        let reward = self.rewards.register_pending(pkg, estimate, d, now);
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
        let ServiceMsg::Reward {
            pkg_id,
            estimate,
            sent_at,
        } = msg
        else {
            return Err(RouteError::UnsupportedMessageKind {
                node: self.id,
                kind: msg.kind(),
            });
        };

        let (observed, d) = self.rewards.resolve(*pkg_id, *estimate, *sent_at)?;
        let default = self.default_value(d, sender);
        let value = self
            .q
            .entry(d)
            .or_default()
            .entry(sender)
            .or_insert(default);
        *value += self.learning_rate * (observed - *value);
        trace!(node = %self.id, destination = %d, neighbor = %sender, observed, value = *value, "Q update");
        Ok(Vec::new())
    }

    fn on_link_changed(
        &mut self,
        _now: SimTime,
        change: LinkChange,
    ) -> Result<Vec<Message>, RouteError> {
        if let LinkChange::Added {
            node, direction, ..
        } = change
        {
            if direction.includes_out() {
                self.ensure_neighbor(node);
            }
        }
        Ok(Vec::new())
    }
}
