//! 统计信息
//!
//! 定义网络仿真统计数据结构。

use serde::Serialize;

use crate::sim::SimTime;

/// 网络统计信息
#[derive(Debug, Default, Clone, Serialize)]
pub struct Stats {
    pub injected_pkts: u64,
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    /// 因无可达路由而丢弃的数据包
    pub dropped_pkts: u64,
    /// 在链路断开后才完成传输的数据包
    pub stale_transmissions: u64,
    pub service_msgs: u64,
    /// 送达耗时总和（虚拟时间单位）
    pub total_delivery_time: f64,
    pub max_delivery_time: f64,
}

impl Stats {
    pub(crate) fn on_delivered(&mut self, size: u32, start: SimTime, done: SimTime) {
        let took = done.saturating_sub(start).as_secs_f64();
        self.delivered_pkts += 1;
        self.delivered_bytes += size as u64;
        self.total_delivery_time += took;
        self.max_delivery_time = self.max_delivery_time.max(took);
    }

    /// 平均送达耗时；尚无送达时为 None
    pub fn mean_delivery_time(&self) -> Option<f64> {
        (self.delivered_pkts > 0).then(|| self.total_delivery_time / self.delivered_pkts as f64)
    }
}
