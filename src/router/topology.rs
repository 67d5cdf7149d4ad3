//! 路由器的本地拓扑视图
//!
//! 有向图，节点 id 为键，按 id 升序枚举邻居，保证转发决策可复现。

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use crate::net::{EdgeData, NeighborState, NodeId};

#[derive(Debug, Clone, Default)]
pub struct Topology {
    adj: BTreeMap<NodeId, NeighborState>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加有向边。边已存在时不做任何修改并返回 false。
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, edge: EdgeData) -> bool {
        let out = self.adj.entry(from).or_default();
        if out.contains_key(&to) {
            return false;
        }
        out.insert(to, edge);
        true
    }

    /// 删除有向边，不影响反向边。
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> Option<EdgeData> {
        self.adj.get_mut(&from)?.remove(&to)
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.edge(from, to).is_some()
    }

    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&EdgeData> {
        self.adj.get(&from)?.get(&to)
    }

    /// 出边邻居（升序）
    pub fn out_neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.adj
            .get(&node)
            .map(|out| out.keys().copied().collect())
            .unwrap_or_default()
    }

    /// 入边邻居（升序）
    pub fn in_neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.adj
            .iter()
            .filter(|(_, out)| out.contains_key(&node))
            .map(|(&from, _)| from)
            .collect()
    }

    /// 出边及其属性的快照
    pub fn out_edges(&self, node: NodeId) -> NeighborState {
        self.adj.get(&node).cloned().unwrap_or_default()
    }

    /// 用 `state` 整体替换 `node` 的出边集合。
    pub fn replace_out_edges(&mut self, node: NodeId, state: &NeighborState) {
        self.adj.insert(node, state.clone());
    }

    pub fn edge_count(&self) -> usize {
        self.adj.values().map(|out| out.len()).sum()
    }

    /// 以边权最小的路径从 `src` 到 `dst`（含两端）。不可达时返回 None。
    pub fn shortest_path(&self, src: NodeId, dst: NodeId) -> Option<Vec<NodeId>> {
        if src == dst {
            return Some(vec![src]);
        }

        let mut dist: HashMap<NodeId, f64> = HashMap::from([(src, 0.0)]);
        let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
        let mut heap = BinaryHeap::from([Frontier { cost: 0.0, node: src }]);

        while let Some(Frontier { cost, node }) = heap.pop() {
            if node == dst {
                break;
            }
            if cost > dist.get(&node).copied().unwrap_or(f64::INFINITY) {
                continue;
            }
            let Some(out) = self.adj.get(&node) else {
                continue;
            };
            for (&next, edge) in out {
                let next_cost = cost + edge.weight;
                if next_cost < dist.get(&next).copied().unwrap_or(f64::INFINITY) {
                    dist.insert(next, next_cost);
                    prev.insert(next, node);
                    heap.push(Frontier {
                        cost: next_cost,
                        node: next,
                    });
                }
            }
        }

        if !prev.contains_key(&dst) {
            return None;
        }
        let mut path = vec![dst];
        let mut cur = dst;
        while let Some(&p) = prev.get(&cur) {
            path.push(p);
            cur = p;
        }
        path.reverse();
        Some(path)
    }
}

impl FromIterator<(NodeId, NodeId, EdgeData)> for Topology {
    fn from_iter<I: IntoIterator<Item = (NodeId, NodeId, EdgeData)>>(iter: I) -> Self {
        let mut topo = Topology::new();
        for (from, to, edge) in iter {
            topo.add_edge(from, to, edge);
        }
        topo
    }
}

// BinaryHeap 是 max-heap：代价小者优先，同代价时 id 小者优先。
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    node: NodeId,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.node.cmp(&other.node))
            .reverse()
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}
