//! 处理完成事件（节点处理槽出队）

use super::id::NodeId;
use super::net_world::net_of;
use crate::sim::{Event, Simulator, World};

/// 事件：节点处理完一个入站数据包，交给路由器并开始处理下一个。
#[derive(Debug)]
pub struct ProcessDone {
    pub node: NodeId,
}

impl Event for ProcessDone {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let ProcessDone { node } = *self;
        net_of(world).on_process_done(node, sim);
    }
}
