//! 仿真核心模块
//!
//! 此模块包含事件驱动仿真的核心组件：仿真时间、事件、世界、仿真器，以及运行参数。

// 子模块声明
mod event;
mod run_params;
mod scheduled_event;
mod simulator;
mod time;
mod world;

// 重新导出公共接口
pub use event::Event;
pub use run_params::{
    EdgeSpec, LinkAction, PkgDistr, QRouterSettings, RouterEnvSettings,
    RouterSettings, RunParams, RunStep, Settings, DEFAULT_PKG_SIZE,
};
pub use scheduled_event::ScheduledEvent;
pub use simulator::Simulator;
pub use time::SimTime;
pub use world::World;
