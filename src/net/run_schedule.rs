//! 运行计划事件
//!
//! 依次执行运行参数中的计划：批量注入数据包（每个之后等待 `interval`），
//! 或断开/恢复一条链路（之后等待 `pause_after`）。

use std::sync::Arc;

use super::id::NodeId;
use super::net_world::net_of;
use crate::sim::{Event, LinkAction, RunParams, RunStep, SimTime, Simulator, World};
use tracing::{debug, info};

#[derive(Debug)]
struct Plan {
    steps: Vec<RunStep>,
    pkg_size: u32,
    /// 未指定 sources/destinations 时使用的节点集合
    all_nodes: Vec<NodeId>,
}

/// 事件：执行计划中的第 `step` 步，已经注入了 `sent` 个数据包。
#[derive(Debug)]
pub struct RunSchedule {
    plan: Arc<Plan>,
    step: usize,
    sent: u64,
}

impl RunSchedule {
    pub fn new(params: &RunParams) -> Self {
        let pkg_distr = &params.settings.pkg_distr;
        Self {
            plan: Arc::new(Plan {
                steps: pkg_distr.sequence.clone(),
                pkg_size: pkg_distr.pkg_size,
                all_nodes: params.node_ids().into_iter().map(NodeId).collect(),
            }),
            step: 0,
            sent: 0,
        }
    }

    fn at(&self, step: usize, sent: u64) -> Self {
        Self {
            plan: Arc::clone(&self.plan),
            step,
            sent,
        }
    }
}

fn node_list(ids: &Option<Vec<usize>>, all: &[NodeId]) -> Vec<NodeId> {
    match ids {
        Some(ids) => ids.iter().copied().map(NodeId).collect(),
        None => all.to_vec(),
    }
}

impl Event for RunSchedule {
    #[tracing::instrument(skip(self, sim, world), fields(step = self.step, sent = self.sent))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let net = net_of(world);
        let mut step = self.step;
        let mut sent = self.sent;
        loop {
            let Some(current) = self.plan.steps.get(step) else {
                info!(now = ?sim.now(), "📋 运行计划执行完毕");
                return;
            };
            match current {
                RunStep::Packets {
                    count,
                    sources,
                    destinations,
                    interval,
                } => {
                    if sent >= *count {
                        step += 1;
                        sent = 0;
                        continue;
                    }
                    let sources = node_list(sources, &self.plan.all_nodes);
                    let dests = node_list(destinations, &self.plan.all_nodes);
                    if net
                        .inject_random(&sources, &dests, self.plan.pkg_size, sim)
                        .is_none()
                    {
                        debug!("节点列表为空，跳过本批数据包");
                        step += 1;
                        sent = 0;
                        continue;
                    }
                    sim.schedule_in(
                        SimTime::from_secs_f64(*interval),
                        self.at(step, sent + 1),
                    );
                    return;
                }
                RunStep::Link {
                    action,
                    u,
                    v,
                    pause_after,
                } => {
                    let (u, v) = (NodeId(*u), NodeId(*v));
                    let result = match action {
                        LinkAction::Break => net.break_link(u, v, sim),
                        LinkAction::Restore => net.restore_link(u, v, sim),
                    };
                    net.settle(result);
                    sim.schedule_in(SimTime::from_secs_f64(*pause_after), self.at(step + 1, 0));
                    return;
                }
            }
        }
    }
}
