use std::sync::{Arc, Mutex};

use crate::net::{
    DeliveryLog, EdgeData, Message, NeighborState, NetWorld, NodeId, Package, ServiceMsg,
};
use crate::router::{LinkStateDb, LinkStateRouter, Router, RouterKind, Topology};
use crate::sim::{RunParams, Settings, SimTime, Simulator};
use crate::topo::line::{LineOpts, build_line};
use crate::topo::ring::{RingOpts, build_ring};

fn bidir(edges: &[(usize, usize)]) -> Topology {
    let e = EdgeData::from_bandwidth(10);
    edges
        .iter()
        .flat_map(|&(u, v)| [(NodeId(u), NodeId(v), e), (NodeId(v), NodeId(u), e)])
        .collect()
}

fn state(nbrs: &[usize]) -> NeighborState {
    nbrs.iter()
        .map(|&n| (NodeId(n), EdgeData::from_bandwidth(10)))
        .collect()
}

fn announce_targets(msgs: &[Message]) -> Vec<(NodeId, u64)> {
    msgs.iter()
        .map(|m| match m {
            Message::Out { to, inner, .. } => match &**inner {
                Message::Service {
                    msg: ServiceMsg::StateAnnounce { seq, .. },
                } => (*to, *seq),
                other => panic!("unexpected inner {other:?}"),
            },
            other => panic!("unexpected message {other:?}"),
        })
        .collect()
}

fn params(network: Vec<crate::sim::EdgeSpec>) -> RunParams {
    RunParams {
        network,
        settings: Settings::default(),
        seed: None,
    }
}

#[test]
fn init_floods_own_state_to_every_out_neighbor() {
    let mut r = LinkStateRouter::new(NodeId(1), bidir(&[(0, 1), (1, 2)]));
    let out = r.handle(SimTime::ZERO, Message::init()).expect("init");
    assert_eq!(announce_targets(&out), vec![(NodeId(0), 1), (NodeId(2), 1)]);
    assert_eq!(r.db().seq_num(), 1);
    assert_eq!(
        r.db().announcement(NodeId(1)).map(|a| a.state.clone()),
        Some(state(&[0, 2]))
    );
}

#[test]
fn accepted_announcement_replaces_state_and_refloods_except_sender() {
    let mut topo = bidir(&[(0, 1), (0, 2), (0, 3)]);
    let mut db = LinkStateDb::new(NodeId(0));

    let flood = db
        .process(&mut topo, NodeId(1), NodeId(5), 1, &state(&[6, 7]))
        .expect("fresh announcement");
    assert_eq!(announce_targets(&flood), vec![(NodeId(2), 1), (NodeId(3), 1)]);
    assert_eq!(topo.out_neighbors(NodeId(5)), vec![NodeId(6), NodeId(7)]);
    assert_eq!(db.known_nodes(), 1);
}

#[test]
fn stale_and_duplicate_announcements_are_dropped() {
    let mut topo = bidir(&[(0, 1)]);
    let mut db = LinkStateDb::new(NodeId(0));

    assert!(db.process(&mut topo, NodeId(1), NodeId(4), 3, &state(&[1])).is_some());
    assert!(db.process(&mut topo, NodeId(1), NodeId(4), 3, &state(&[])).is_none());
    assert!(db.process(&mut topo, NodeId(1), NodeId(4), 2, &state(&[])).is_none());
    assert_eq!(topo.out_neighbors(NodeId(4)), vec![NodeId(1)]);

    assert!(db.process(&mut topo, NodeId(1), NodeId(4), 4, &state(&[])).is_some());
    assert!(topo.out_neighbors(NodeId(4)).is_empty());
    assert_eq!(db.announcement(NodeId(4)).map(|a| a.seq), Some(4));
}

#[test]
fn own_announcement_looping_back_is_ignored() {
    let mut topo = bidir(&[(0, 1), (0, 2)]);
    let mut db = LinkStateDb::new(NodeId(0));
    db.announce(&topo);

    assert!(db.process(&mut topo, NodeId(1), NodeId(0), 1, &state(&[])).is_none());
    assert_eq!(topo.out_neighbors(NodeId(0)), vec![NodeId(1), NodeId(2)]);

    // someone else's claim about us before we ever announced is ignored too
    let mut other = LinkStateDb::new(NodeId(0));
    assert!(other.process(&mut topo, NodeId(1), NodeId(0), 7, &state(&[])).is_none());
}

#[test]
fn forwards_along_shortest_path_or_reports_no_route() {
    let mut r = LinkStateRouter::new(NodeId(0), bidir(&[(0, 1), (1, 2), (2, 3)]));
    let pkg = Package::new(1, 10, NodeId(3), SimTime::ZERO);
    let (next, extra) = r.route(SimTime::ZERO, None, &pkg).expect("route");
    assert_eq!(next, NodeId(1));
    assert!(extra.is_empty());

    let lost = Package::new(2, 10, NodeId(8), SimTime::ZERO);
    let err = r.route(SimTime::ZERO, None, &lost).expect_err("no route");
    assert!(err.is_transient());
}

#[test]
fn flooding_converges_on_ring_within_message_bound() {
    let p = params(build_ring(&RingOpts {
        nodes: 5,
        ..RingOpts::default()
    }));
    let mut sim = Simulator::default();
    let mut world = NetWorld::from_params(&p, RouterKind::LinkState);
    world.start(&p, &mut sim);
    world.run(&mut sim, None).expect("run");

    let directed_edges = 10;
    let announcements = 5;
    assert!(world.net.stats.service_msgs <= (directed_edges * announcements) as u64);

    for id in world.net.node_ids() {
        let router = world
            .net
            .router(id)
            .and_then(|r| r.as_any().downcast_ref::<LinkStateRouter>())
            .expect("link-state router");
        assert_eq!(router.topology().edge_count(), directed_edges, "{id}");
        assert_eq!(router.db().known_nodes(), 5, "{id}");
        for origin in 0..5 {
            assert_eq!(
                router.db().announcement(NodeId(origin)).map(|a| a.seq),
                Some(1),
                "{id} about n{origin}"
            );
        }
    }
}

#[test]
fn announcement_sequence_never_decreases_across_churn() {
    let p = params(build_line(&LineOpts {
        nodes: 4,
        bandwidth: 1024,
    }));
    let mut sim = Simulator::default();
    let mut world = NetWorld::from_params(&p, RouterKind::LinkState);
    world.start(&p, &mut sim);

    let seen = |world: &NetWorld, at: usize, origin: usize| {
        world
            .net
            .router(NodeId(at))
            .and_then(|r| r.as_any().downcast_ref::<LinkStateRouter>())
            .and_then(|r| r.db().announcement(NodeId(origin)))
            .map(|a| a.seq)
    };

    let before = seen(&world, 0, 2);
    world
        .net
        .break_link(NodeId(2), NodeId(3), &mut sim)
        .expect("break");
    let after_break = seen(&world, 0, 2);
    world
        .net
        .restore_link(NodeId(2), NodeId(3), &mut sim)
        .expect("restore");
    let after_restore = seen(&world, 0, 2);

    assert_eq!(before, Some(1));
    assert_eq!(after_break, Some(2));
    assert_eq!(after_restore, Some(3));

    let r0 = world.net.router(NodeId(0)).expect("router");
    assert!(r0.topology().has_edge(NodeId(2), NodeId(3)));
}

#[test]
fn delivers_over_line_after_flooding() {
    let p = params(build_line(&LineOpts {
        nodes: 4,
        bandwidth: 1024,
    }));
    let log = Arc::new(Mutex::new(DeliveryLog::default()));
    let mut sim = Simulator::default();
    let mut world = NetWorld::from_params(&p, RouterKind::LinkState);
    world.net.set_sink(Box::new(Arc::clone(&log)));
    world.start(&p, &mut sim);

    world.net.inject(NodeId(0), NodeId(3), 1024, &mut sim);
    world.net.inject(NodeId(3), NodeId(0), 1024, &mut sim);
    world.run(&mut sim, None).expect("run");

    assert_eq!(world.net.stats.delivered_pkts, 2);
    assert_eq!(
        log.lock().expect("log lock").durations(),
        vec![3.0, 3.0]
    );
}
