use std::sync::{Arc, Mutex};

use crate::error::RouteError;
use crate::net::{DeliveryLog, DeliverySink, Message, NetWorld, Network, NodeId, Package};
use crate::router::{Router, RouterKind, Topology};
use crate::sim::{
    EdgeSpec, Event, LinkAction, PkgDistr, RouterEnvSettings, RunParams, RunStep, Settings,
    SimTime, Simulator, World,
};
use crate::topo::line::{LineOpts, build_line};
use crate::topo::ring::{RingOpts, build_ring};

fn params(network: Vec<EdgeSpec>, delay: f64, sequence: Vec<RunStep>) -> RunParams {
    RunParams {
        network,
        settings: Settings {
            pkg_distr: PkgDistr {
                sequence,
                ..PkgDistr::default()
            },
            router_env: RouterEnvSettings {
                pkg_process_delay: delay,
            },
            ..Settings::default()
        },
        seed: Some(11),
    }
}

fn line(nodes: usize) -> Vec<EdgeSpec> {
    build_line(&LineOpts {
        nodes,
        bandwidth: 1024,
    })
}

fn started(p: &RunParams, kind: RouterKind) -> (Simulator, NetWorld, Arc<Mutex<DeliveryLog>>) {
    let mut sim = Simulator::default();
    let mut world = NetWorld::from_params(p, kind);
    let log = Arc::new(Mutex::new(DeliveryLog::default()));
    world.net.set_sink(Box::new(Arc::clone(&log)));
    world.start(p, &mut sim);
    (sim, world, log)
}

fn completions(log: &Arc<Mutex<DeliveryLog>>) -> Vec<SimTime> {
    log.lock()
        .expect("log lock")
        .records
        .iter()
        .map(|&(_, done)| done)
        .collect()
}

fn secs(s: f64) -> SimTime {
    SimTime::from_secs_f64(s)
}

struct BreakLink {
    u: NodeId,
    v: NodeId,
}

impl Event for BreakLink {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        let result = w.net.break_link(self.u, self.v, sim);
        w.net.settle(result);
    }
}

#[test]
fn line_delivery_pays_transmission_and_processing_per_hop() {
    let p = params(line(3), 0.25, Vec::new());
    let (mut sim, mut world, log) = started(&p, RouterKind::LinkState);

    world.net.inject(NodeId(0), NodeId(2), 1024, &mut sim);
    world.run(&mut sim, None).expect("run");

    // two hops of 1024 / 1024 plus processing at 0, 1 and 2
    assert_eq!(completions(&log), vec![secs(2.75)]);
    assert!(secs(2.75) >= secs(2.0 + 2.0 * 0.25));
    assert_eq!(world.net.stats.delivered_pkts, 1);
    assert_eq!(world.net.stats.delivered_bytes, 1024);
    assert_eq!(world.net.stats.mean_delivery_time(), Some(2.75));

    let hops: Vec<u64> = [(0, 1), (1, 2), (1, 0), (2, 1)]
        .into_iter()
        .map(|(u, v)| {
            world
                .net
                .link(NodeId(u), NodeId(v))
                .expect("link")
                .transmitted_pkts
        })
        .collect();
    assert_eq!(hops, vec![1, 1, 0, 0]);
}

#[test]
fn link_carries_one_package_at_a_time() {
    let p = params(line(2), 0.0, Vec::new());
    let (mut sim, mut world, log) = started(&p, RouterKind::LinkState);

    for _ in 0..3 {
        world.net.inject(NodeId(0), NodeId(1), 1024, &mut sim);
    }
    world.net.inject(NodeId(0), NodeId(1), 512, &mut sim);
    world.run(&mut sim, None).expect("run");

    assert_eq!(
        completions(&log),
        vec![secs(1.0), secs(2.0), secs(3.0), secs(3.5)]
    );
    let link = world.net.link(NodeId(0), NodeId(1)).expect("link");
    assert_eq!(link.transmitted_pkts, 4);
    assert_eq!(link.busy_time, secs(3.5));
    assert!(!link.is_busy());
}

#[test]
fn processing_slot_serialises_inbound_packages() {
    let p = params(line(2), 1.0, Vec::new());
    let (mut sim, mut world, log) = started(&p, RouterKind::LinkState);

    world.net.inject(NodeId(0), NodeId(1), 1024, &mut sim);
    world.net.inject(NodeId(0), NodeId(1), 1024, &mut sim);
    assert_eq!(world.net.node(NodeId(0)).expect("node").queued(), 1);
    world.run(&mut sim, None).expect("run");

    assert_eq!(completions(&log), vec![secs(3.0), secs(4.0)]);
}

#[test]
fn package_in_flight_survives_link_failure() {
    let sequence = vec![
        RunStep::Packets {
            count: 1,
            sources: Some(vec![0]),
            destinations: Some(vec![2]),
            interval: 0.5,
        },
        RunStep::Link {
            action: LinkAction::Break,
            u: 0,
            v: 1,
            pause_after: 0.0,
        },
        RunStep::Packets {
            count: 1,
            sources: Some(vec![0]),
            destinations: Some(vec![2]),
            interval: 1.0,
        },
    ];
    let p = params(line(3), 0.0, sequence);
    let (mut sim, mut world, log) = started(&p, RouterKind::LinkState);
    world.run(&mut sim, None).expect("run");

    let stats = &world.net.stats;
    assert_eq!(stats.injected_pkts, 2);
    assert_eq!(stats.delivered_pkts, 1);
    assert_eq!(stats.dropped_pkts, 1);
    assert_eq!(stats.stale_transmissions, 1);
    assert_eq!(completions(&log), vec![secs(2.0)]);
    assert!(!world.net.link(NodeId(0), NodeId(1)).expect("link").up);
}

#[test]
fn traffic_reroutes_around_a_broken_link_and_back() {
    let p = params(build_ring(&RingOpts::default()), 0.0, Vec::new());
    let (mut sim, mut world, log) = started(&p, RouterKind::LinkState);

    world
        .net
        .break_link(NodeId(0), NodeId(1), &mut sim)
        .expect("break");
    world.net.inject(NodeId(0), NodeId(1), 1024, &mut sim);
    world.run(&mut sim, None).expect("run");
    assert_eq!(completions(&log), vec![secs(3.0)]);
    assert_eq!(
        world.net.link(NodeId(0), NodeId(3)).expect("link").transmitted_pkts,
        1
    );

    world
        .net
        .restore_link(NodeId(0), NodeId(1), &mut sim)
        .expect("restore");
    world.net.inject(NodeId(0), NodeId(1), 1024, &mut sim);
    world.run(&mut sim, None).expect("run");
    assert_eq!(completions(&log), vec![secs(3.0), secs(4.0)]);
    assert_eq!(
        world.net.link(NodeId(0), NodeId(1)).expect("link").transmitted_pkts,
        1
    );
    assert_eq!(world.net.stats.dropped_pkts, 0);
}

#[test]
fn breaking_an_unknown_link_is_reported() {
    let p = params(line(3), 0.0, Vec::new());
    let (mut sim, mut world, _log) = started(&p, RouterKind::LinkState);
    let err = world
        .net
        .break_link(NodeId(0), NodeId(2), &mut sim)
        .expect_err("no such link");
    assert!(matches!(err, RouteError::UnknownEdge { .. }));
}

#[test]
fn isolated_q_node_stops_the_run() {
    // node 1 exists (ids are indices) but has no edges
    let p = params(
        vec![EdgeSpec {
            u: 0,
            v: 2,
            bandwidth: 1024,
        }],
        0.0,
        Vec::new(),
    );
    let (mut sim, mut world, _log) = started(&p, RouterKind::SimpleQ);
    assert_eq!(world.net.node_count(), 3);

    world.net.inject(NodeId(1), NodeId(0), 1024, &mut sim);
    world.net.inject(NodeId(0), NodeId(2), 1024, &mut sim);
    let err = world.run(&mut sim, None).expect_err("fatal");
    assert_eq!(err, RouteError::NoOutNeighbors { node: NodeId(1) });
}

#[test]
fn same_seed_gives_identical_runs() {
    let sequence = vec![RunStep::Packets {
        count: 30,
        sources: None,
        destinations: None,
        interval: 0.3,
    }];
    let p = params(
        build_ring(&RingOpts {
            nodes: 5,
            ..RingOpts::default()
        }),
        0.1,
        sequence,
    );

    let run = |kind| {
        let (mut sim, mut world, log) = started(&p, kind);
        world.run(&mut sim, None).expect("run");
        let records = log.lock().expect("log lock").records.clone();
        (records, world.net.stats.clone())
    };

    for kind in [RouterKind::LinkState, RouterKind::SimpleQ] {
        let (a, sa) = run(kind);
        let (b, sb) = run(kind);
        assert_eq!(a, b);
        assert_eq!(sa.injected_pkts, 30);
        assert_eq!(sa.delivered_pkts, sb.delivered_pkts);
        assert_eq!(sa.service_msgs, sb.service_msgs);
    }
}

/// Arms two delayed deliveries at init and interrupts one on any link change.
struct Timer {
    id: NodeId,
    topology: Topology,
    arm: bool,
    interrupt: Option<u64>,
}

impl Router for Timer {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &'static str {
        "timer"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    fn init(
        &mut self,
        _now: SimTime,
        _config: &serde_json::Value,
    ) -> Result<Vec<Message>, RouteError> {
        if !self.arm {
            return Ok(Vec::new());
        }
        let received = |id| Message::PkgReceived {
            pkg: Package::new(id, 64, NodeId(0), SimTime::ZERO),
        };
        Ok(vec![
            Message::delayed(1, SimTime::from_secs(5), received(100)),
            Message::delayed(2, SimTime::from_secs(10), received(101)),
        ])
    }

    fn route(
        &mut self,
        _now: SimTime,
        _sender: Option<NodeId>,
        pkg: &Package,
    ) -> Result<(NodeId, Vec<Message>), RouteError> {
        Err(RouteError::NoRouteToDestination {
            node: self.id,
            destination: pkg.destination,
        })
    }

    fn on_link_changed(
        &mut self,
        _now: SimTime,
        _change: crate::router::LinkChange,
    ) -> Result<Vec<Message>, RouteError> {
        Ok(self
            .interrupt
            .map(|delay_id| vec![Message::InterruptDelay { delay_id }])
            .unwrap_or_default())
    }
}

fn timer_pair(second_interrupt: Option<u64>) -> (Simulator, NetWorld, Arc<Mutex<DeliveryLog>>) {
    let mut net = Network::new(SimTime::ZERO, 0);
    net.connect_pair(NodeId(0), NodeId(1), 1024);
    for (i, arm, interrupt) in [(0, true, Some(2)), (1, false, second_interrupt)] {
        let topology = net.local_topology(NodeId(i));
        net.add_node(move |id| {
            Box::new(Timer {
                id,
                topology,
                arm,
                interrupt,
            })
        });
    }
    let log = Arc::new(Mutex::new(DeliveryLog::default()));
    net.set_sink(Box::new(Arc::clone(&log)));

    let mut sim = Simulator::default();
    let mut world = NetWorld { net };
    world.net.start(&mut sim);
    sim.schedule(
        SimTime::from_secs(3),
        BreakLink {
            u: NodeId(0),
            v: NodeId(1),
        },
    );
    (sim, world, log)
}

#[test]
fn interrupted_delay_fires_early_and_only_once() {
    let (mut sim, mut world, log) = timer_pair(None);
    world.run(&mut sim, None).expect("run");

    assert_eq!(
        completions(&log),
        vec![SimTime::from_secs(3), SimTime::from_secs(5)]
    );
    assert_eq!(world.net.stats.delivered_pkts, 2);
    assert_eq!(sim.now(), SimTime::from_secs(10));
}

#[test]
fn interrupting_an_unknown_delay_is_fatal() {
    let (mut sim, mut world, log) = timer_pair(Some(7));
    let err = world.run(&mut sim, None).expect_err("unknown delay");
    assert_eq!(
        err,
        RouteError::UnknownDelay {
            node: NodeId(1),
            delay_id: 7
        }
    );
    // n0 interrupted its own timer first; the 5 s timer never fired
    assert_eq!(completions(&log), vec![SimTime::from_secs(3)]);
}

/// Counts deliveries without keeping them.
#[derive(Default)]
struct Counter(u64);

impl DeliverySink for Counter {
    fn record(&mut self, _start: SimTime, _completion: SimTime) {
        self.0 += 1;
    }
}

#[test]
fn custom_sink_sees_every_delivery() {
    let p = params(line(2), 0.0, Vec::new());
    let (mut sim, mut world, _log) = started(&p, RouterKind::SimpleQ);
    let counter = Arc::new(Mutex::new(Counter::default()));
    world.net.set_sink(Box::new(Arc::clone(&counter)));

    world.net.inject(NodeId(0), NodeId(1), 1024, &mut sim);
    world.net.inject(NodeId(1), NodeId(0), 1024, &mut sim);
    world.net.inject(NodeId(1), NodeId(1), 1024, &mut sim);
    world.run(&mut sim, None).expect("run");

    assert_eq!(counter.lock().expect("counter lock").0, 3);
    assert_eq!(world.net.stats.delivered_pkts, 3);
}

#[test]
fn restoring_a_live_link_keeps_its_transmission_current() {
    let p = params(line(2), 0.0, Vec::new());
    let (mut sim, mut world, log) = started(&p, RouterKind::LinkState);
    assert_eq!(world.net.link(NodeId(0), NodeId(1)).expect("link").bandwidth(), 1024);

    world.net.inject(NodeId(0), NodeId(1), 1024, &mut sim);
    world.run(&mut sim, Some(secs(0.5))).expect("run");
    assert!(world.net.link(NodeId(0), NodeId(1)).expect("link").is_busy());

    world
        .net
        .restore_link(NodeId(0), NodeId(1), &mut sim)
        .expect("restore");
    world.run(&mut sim, None).expect("run");

    assert_eq!(completions(&log), vec![secs(1.0)]);
    assert_eq!(world.net.stats.stale_transmissions, 0);
}
