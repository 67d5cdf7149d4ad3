//! 链路类型
//!
//! 有向链路：独占的传输介质（容量 1 的 FIFO 资源）加上带宽。

use super::id::NodeId;
use super::message::{EdgeData, Message};
use crate::queue::Slot;
use crate::sim::SimTime;

/// 正在传输或排队等待传输的数据包消息
#[derive(Debug)]
pub(crate) struct InFlight {
    pub msg: Message,
    pub bytes: u32,
    /// 请求传输时链路的代数
    pub generation: u64,
}

/// 网络链路
#[derive(Debug)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    /// 恢复链路时重新下发给路由器的属性
    pub edge: EdgeData,
    pub up: bool,
    /// 每次断开/恢复递增，用来识别跨越拓扑变化的在途传输
    pub generation: u64,
    pub transmitted_pkts: u64,
    pub busy_time: SimTime,
    pub(crate) tx: Slot<InFlight>,
}

impl Link {
    /// 创建新链路
    pub fn new(from: NodeId, to: NodeId, bandwidth: u64) -> Self {
        Self {
            from,
            to,
            edge: EdgeData::from_bandwidth(bandwidth),
            up: true,
            generation: 0,
            transmitted_pkts: 0,
            busy_time: SimTime::ZERO,
            tx: Slot::new(),
        }
    }

    pub fn bandwidth(&self) -> u64 {
        self.edge.bandwidth
    }

    /// 传输 `bytes` 字节所需时间：ceil(bytes / bandwidth) 个虚拟时间单位（按纳秒取整）
    pub(crate) fn tx_time(&self, bytes: u32) -> SimTime {
        if self.edge.bandwidth == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bw = self.edge.bandwidth as u128;
        let nanos = ((bytes as u128).saturating_mul(1_000_000_000u128) + (bw - 1)) / bw;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }

    /// 是否有数据包正在传输
    pub fn is_busy(&self) -> bool {
        self.tx.is_busy()
    }

    /// 排队等待传输的数据包数
    pub fn queued(&self) -> usize {
        self.tx.queued()
    }

    /// 状态不变时不递增代数
    pub(crate) fn set_up(&mut self, up: bool) {
        if self.up == up {
            return;
        }
        self.up = up;
        self.generation = self.generation.wrapping_add(1);
    }
}
