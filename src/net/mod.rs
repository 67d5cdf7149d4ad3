//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件：消息、节点环境、链路、网络，以及驱动它们的事件。

// 子模块声明
mod delay_expired;
mod id;
mod link;
mod link_ready;
mod message;
mod net_world;
mod network;
mod node;
mod process_done;
mod run_schedule;
mod sink;
mod stats;

// 重新导出公共接口
pub use delay_expired::DelayExpired;
pub use id::{LinkId, NodeId};
pub use link::Link;
pub use link_ready::LinkReady;
pub use message::{Direction, EdgeData, Message, NeighborState, Package, ServiceMsg};
pub use net_world::NetWorld;
pub use network::Network;
pub use node::NodeEnv;
pub use process_done::ProcessDone;
pub use run_schedule::RunSchedule;
pub use sink::{DeliveryLog, DeliverySink};
pub use stats::Stats;
