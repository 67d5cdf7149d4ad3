//! 延迟到期事件

use super::id::NodeId;
use super::net_world::net_of;
use crate::sim::{Event, Simulator, World};

/// 事件：延迟消息计时到期。令牌不匹配（已被中断或覆盖）时什么也不做。
#[derive(Debug)]
pub struct DelayExpired {
    pub node: NodeId,
    pub delay_id: u64,
    pub token: u64,
}

impl Event for DelayExpired {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DelayExpired {
            node,
            delay_id,
            token,
        } = *self;
        net_of(world).on_delay_expired(node, delay_id, token, sim);
    }
}
