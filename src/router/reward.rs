//! Delayed-feedback bookkeeping shared by reward-driven routers.
//!
//! When a router forwards a package it records the forwarding time under the
//! package id and hands a `Reward` back to the upstream hop. When the
//! downstream hop's `Reward` comes back, the entry is consumed and turned into
//! an observed cost: the downstream estimate plus the virtual time the package
//! spent getting one hop closer.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::error::RouteError;
use crate::net::{NodeId, Package, ServiceMsg};
use crate::sim::SimTime;

#[derive(Debug, Clone)]
pub struct RewardTracker<C> {
    node: NodeId,
    pending: HashMap<u64, (SimTime, C)>,
}

impl<C> RewardTracker<C> {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            pending: HashMap::new(),
        }
    }

    /// Record `(now, context)` for `pkg` and build the reward for the upstream
    /// hop carrying this node's `estimate`.
    pub fn register_pending(
        &mut self,
        pkg: &Package,
        estimate: f64,
        context: C,
        now: SimTime,
    ) -> ServiceMsg {
        if self.pending.insert(pkg.id, (now, context)).is_some() {
            // A package looped back before its previous hop was rewarded.
            warn!(node = %self.node, pkg_id = pkg.id, "replacing pending reward entry");
        }
        trace!(node = %self.node, pkg_id = pkg.id, estimate, "registered pending reward");
        ServiceMsg::Reward {
            pkg_id: pkg.id,
            estimate,
            sent_at: now,
        }
    }

    /// Consume the pending entry for `pkg_id`, returning the observed cost and
    /// the context recorded at forwarding time.
    pub fn resolve(
        &mut self,
        pkg_id: u64,
        estimate: f64,
        sent_at: SimTime,
    ) -> Result<(f64, C), RouteError> {
        let (recorded, context) =
            self.pending
                .remove(&pkg_id)
                .ok_or(RouteError::UnknownPendingPackage {
                    node: self.node,
                    pkg_id,
                })?;
        let elapsed = sent_at.saturating_sub(recorded).as_secs_f64();
        Ok((estimate + elapsed, context))
    }

    pub fn is_pending(&self, pkg_id: u64) -> bool {
        self.pending.contains_key(&pkg_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
