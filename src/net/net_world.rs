//! 网络世界实现
//!
//! 定义网络仿真的世界（World）实现，持有网络拓扑。

use super::network::Network;
use super::run_schedule::RunSchedule;
use crate::error::RouteError;
use crate::router::RouterKind;
use crate::sim::{RunParams, SimTime, Simulator, World};
use std::any::Any;

/// 一个默认的网络世界实现：持有 Network。出现致命路由错误时停止仿真。
#[derive(Default)]
pub struct NetWorld {
    pub net: Network,
}

impl NetWorld {
    pub fn from_params(params: &RunParams, kind: RouterKind) -> Self {
        Self {
            net: Network::from_params(params, kind),
        }
    }

    /// 初始化所有路由器并在当前时刻开始执行运行计划
    pub fn start(&mut self, params: &RunParams, sim: &mut Simulator) {
        self.net.start(sim);
        sim.schedule(sim.now(), RunSchedule::new(params));
    }

    /// 运行到事件耗尽（或 `until`），有致命错误时返回它。
    pub fn run(&mut self, sim: &mut Simulator, until: Option<SimTime>) -> Result<(), RouteError> {
        match until {
            Some(t) => sim.run_until(t, self),
            None => sim.run(self),
        }
        self.finish()
    }

    /// 取出致命错误（若有）
    pub fn finish(&mut self) -> Result<(), RouteError> {
        match self.net.take_failure() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn should_stop(&self) -> bool {
        self.net.failure().is_some()
    }
}

/// 从事件拿到网络
pub(crate) fn net_of(world: &mut dyn World) -> &mut Network {
    &mut world
        .as_any_mut()
        .downcast_mut::<NetWorld>()
        .expect("world must be NetWorld")
        .net
}
