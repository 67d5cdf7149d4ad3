//! 环形拓扑构建

use crate::sim::EdgeSpec;

#[derive(Debug, Clone)]
pub struct RingOpts {
    pub nodes: usize,
    pub bandwidth: u64,
    /// 环上各边带宽的覆盖值 (边的起点 i，即 i <-> i+1)
    pub overrides: Vec<(usize, u64)>,
}

impl Default for RingOpts {
    fn default() -> Self {
        Self {
            nodes: 4,
            bandwidth: 1024,
            overrides: Vec::new(),
        }
    }
}

/// 构建环形拓扑：0 <-> 1 <-> ... <-> n-1 <-> 0。少于 3 个节点时退化为线形。
pub fn build_ring(opts: &RingOpts) -> Vec<EdgeSpec> {
    let n = opts.nodes;
    let closing = if n >= 3 { n } else { n.saturating_sub(1) };
    (0..closing)
        .map(|i| {
            let bandwidth = opts
                .overrides
                .iter()
                .rev()
                .find(|(at, _)| *at == i)
                .map_or(opts.bandwidth, |(_, bw)| *bw);
            EdgeSpec {
                u: i,
                v: (i + 1) % n,
                bandwidth,
            }
        })
        .collect()
}
