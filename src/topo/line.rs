//! 线形拓扑构建

use crate::sim::EdgeSpec;

/// 线形拓扑配置选项
#[derive(Debug, Clone)]
pub struct LineOpts {
    pub nodes: usize,
    /// 每条边的带宽（字节/虚拟时间单位）
    pub bandwidth: u64,
}

impl Default for LineOpts {
    fn default() -> Self {
        Self {
            nodes: 3,
            bandwidth: 1024,
        }
    }
}

/// 构建线形拓扑
///
/// 拓扑结构：0 <-> 1 <-> ... <-> n-1
pub fn build_line(opts: &LineOpts) -> Vec<EdgeSpec> {
    (1..opts.nodes)
        .map(|v| EdgeSpec {
            u: v - 1,
            v,
            bandwidth: opts.bandwidth,
        })
        .collect()
}
