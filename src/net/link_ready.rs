//! 链路就绪事件（传输完成，驱动链路队列出队）

use super::id::LinkId;
use super::net_world::net_of;
use crate::sim::{Event, Simulator, World};

/// 事件：链路完成一次序列化发送，把数据包交给对端并开始发送队列中的下一个。
#[derive(Debug)]
pub struct LinkReady {
    pub link_id: LinkId,
}

impl Event for LinkReady {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let LinkReady { link_id } = *self;
        net_of(world).on_link_ready(link_id, sim);
    }
}
