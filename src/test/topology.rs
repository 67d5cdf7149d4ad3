use crate::net::{EdgeData, NodeId};
use crate::router::Topology;

fn bidir(edges: &[(usize, usize, u64)]) -> Topology {
    edges
        .iter()
        .flat_map(|&(u, v, bw)| {
            let e = EdgeData::from_bandwidth(bw);
            [(NodeId(u), NodeId(v), e), (NodeId(v), NodeId(u), e)]
        })
        .collect()
}

#[test]
fn add_edge_is_idempotent_and_keeps_original_attributes() {
    let mut topo = Topology::new();
    assert!(topo.add_edge(NodeId(0), NodeId(1), EdgeData::from_bandwidth(10)));
    assert!(!topo.add_edge(NodeId(0), NodeId(1), EdgeData::from_bandwidth(99)));
    assert_eq!(topo.edge_count(), 1);
    assert_eq!(
        topo.edge(NodeId(0), NodeId(1)).map(|e| e.bandwidth),
        Some(10)
    );
    assert!(!topo.has_edge(NodeId(1), NodeId(0)));
}

#[test]
fn remove_edge_leaves_reverse_direction() {
    let mut topo = bidir(&[(0, 1, 10)]);
    assert!(topo.remove_edge(NodeId(0), NodeId(1)).is_some());
    assert!(topo.remove_edge(NodeId(0), NodeId(1)).is_none());
    assert!(topo.has_edge(NodeId(1), NodeId(0)));
    assert!(topo.out_neighbors(NodeId(0)).is_empty());
    assert_eq!(topo.in_neighbors(NodeId(0)), vec![NodeId(1)]);
}

#[test]
fn neighbors_are_listed_in_ascending_order() {
    let topo = bidir(&[(2, 7, 1), (2, 0, 1), (2, 5, 1)]);
    assert_eq!(
        topo.out_neighbors(NodeId(2)),
        vec![NodeId(0), NodeId(5), NodeId(7)]
    );
    assert_eq!(
        topo.in_neighbors(NodeId(2)),
        vec![NodeId(0), NodeId(5), NodeId(7)]
    );
}

#[test]
fn shortest_path_prefers_high_bandwidth_detour() {
    // direct 0-2 is slow (weight 1), 0-1-2 costs 0.1 + 0.1
    let topo = bidir(&[(0, 2, 1), (0, 1, 10), (1, 2, 10)]);
    assert_eq!(
        topo.shortest_path(NodeId(0), NodeId(2)),
        Some(vec![NodeId(0), NodeId(1), NodeId(2)])
    );
    assert_eq!(
        topo.shortest_path(NodeId(2), NodeId(0)),
        Some(vec![NodeId(2), NodeId(1), NodeId(0)])
    );
}

#[test]
fn shortest_path_to_self_and_unreachable() {
    let topo = bidir(&[(0, 1, 10), (2, 3, 10)]);
    assert_eq!(topo.shortest_path(NodeId(0), NodeId(0)), Some(vec![NodeId(0)]));
    assert_eq!(topo.shortest_path(NodeId(0), NodeId(3)), None);
    assert_eq!(topo.shortest_path(NodeId(0), NodeId(9)), None);
}

#[test]
fn replace_out_edges_overwrites_whole_neighbor_set() {
    let mut topo = bidir(&[(0, 1, 10), (0, 2, 10)]);
    let mut state = topo.out_edges(NodeId(0));
    state.remove(&NodeId(1));
    state.insert(NodeId(3), EdgeData::from_bandwidth(5));
    topo.replace_out_edges(NodeId(0), &state);
    assert_eq!(topo.out_neighbors(NodeId(0)), vec![NodeId(2), NodeId(3)]);
    assert!(topo.has_edge(NodeId(1), NodeId(0)));
}
