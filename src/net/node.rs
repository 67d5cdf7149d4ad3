//! 节点环境
//!
//! 包装一个路由器：入站数据包的处理槽（容量 1，FIFO）以及延迟消息的计时表。

use std::collections::HashMap;

use super::id::NodeId;
use super::message::Message;
use crate::queue::Slot;
use crate::router::Router;

/// 节点
pub struct NodeEnv {
    id: NodeId,
    pub(crate) router: Box<dyn Router>,
    /// 等待/正在处理的入站数据包消息
    pub(crate) proc: Slot<Message>,
    /// delay_id -> (取消令牌, 被延迟的消息)
    pub(crate) delays: HashMap<u64, (u64, Message)>,
    next_token: u64,
}

impl NodeEnv {
    pub fn new(id: NodeId, router: Box<dyn Router>) -> Self {
        Self {
            id,
            router,
            proc: Slot::new(),
            delays: HashMap::new(),
            next_token: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn router(&self) -> &dyn Router {
        self.router.as_ref()
    }

    /// 排队等待处理的数据包数（不含正在处理的）
    pub fn queued(&self) -> usize {
        self.proc.queued()
    }

    /// 登记延迟消息，返回其取消令牌。同 id 的旧登记被覆盖（其计时事件随之失效）。
    pub(crate) fn arm_delay(&mut self, delay_id: u64, msg: Message) -> u64 {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        self.delays.insert(delay_id, (token, msg));
        token
    }

    /// 计时到期：令牌匹配时取出消息，否则说明已被中断或覆盖。
    pub(crate) fn expire_delay(&mut self, delay_id: u64, token: u64) -> Option<Message> {
        match self.delays.get(&delay_id) {
            Some((t, _)) if *t == token => self.delays.remove(&delay_id).map(|(_, msg)| msg),
            _ => None,
        }
    }
}
