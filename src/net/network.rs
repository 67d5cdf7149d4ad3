//! 网络环境
//!
//! 持有节点（路由器）与有向链路，负责把路由器发出的消息变成带时间代价的事件：
//! 数据包占用链路 `size / bandwidth`，在接收节点占用处理槽 `process_delay`；
//! 服务消息不占用任何资源：放进待送达队列，在当前事件结束前按 FIFO 全部送达。

use std::collections::{HashMap, VecDeque};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, error, info, trace, warn};

use super::delay_expired::DelayExpired;
use super::id::{LinkId, NodeId};
use super::link::{InFlight, Link};
use super::link_ready::LinkReady;
use super::message::{Direction, EdgeData, Message, Package};
use super::node::NodeEnv;
use super::process_done::ProcessDone;
use super::sink::{DeliveryLog, DeliverySink};
use super::stats::Stats;
use crate::error::RouteError;
use crate::router::{Router, RouterKind, Topology};
use crate::sim::{RunParams, SimTime, Simulator};

/// 网络拓扑与节点环境
pub struct Network {
    nodes: Vec<NodeEnv>,
    links: Vec<Link>,
    edges: HashMap<(NodeId, NodeId), LinkId>,
    process_delay: SimTime,
    next_pkg_id: u64,
    rng: StdRng,
    sink: Box<dyn DeliverySink>,
    failure: Option<RouteError>,
    /// 尚未送达的服务消息 (目的节点, In 消息)
    service_queue: VecDeque<(NodeId, Message)>,
    pub stats: Stats,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(SimTime::ZERO, 0)
    }
}

impl Network {
    pub fn new(process_delay: SimTime, seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            edges: HashMap::new(),
            process_delay,
            next_pkg_id: 1,
            rng: StdRng::seed_from_u64(seed),
            sink: Box::new(DeliveryLog::default()),
            failure: None,
            service_queue: VecDeque::new(),
            stats: Stats::default(),
        }
    }

    /// 按运行参数构建网络：每条边的两个方向各自独立，每个节点的路由器以
    /// 自身及出边邻居诱导出的子图作为初始拓扑视图。
    pub fn from_params(params: &RunParams, kind: RouterKind) -> Self {
        let mut net = Network::new(
            params.settings.router_env.process_delay(),
            params.seed.unwrap_or(0),
        );
        for e in &params.network {
            net.connect_pair(NodeId(e.u), NodeId(e.v), e.bandwidth);
        }
        for idx in 0..params.node_count() {
            let topology = net.local_topology(NodeId(idx));
            net.add_node(|id| kind.build(id, topology, &params.settings.router));
        }
        info!(
            router = %kind,
            nodes = net.nodes.len(),
            links = net.links.len(),
            "🌐 网络已构建"
        );
        net
    }

    /// 添加节点；`make` 收到的是新节点的 id。
    pub fn add_node<F>(&mut self, make: F) -> NodeId
    where
        F: FnOnce(NodeId) -> Box<dyn Router>,
    {
        let id = NodeId(self.nodes.len());
        let router = make(id);
        debug_assert_eq!(router.id(), id, "router id must match node slot");
        self.nodes.push(NodeEnv::new(id, router));
        id
    }

    /// 连接两个节点（创建单向链路）
    pub fn connect(&mut self, from: NodeId, to: NodeId, bandwidth: u64) -> LinkId {
        let id = LinkId(self.links.len());
        self.links.push(Link::new(from, to, bandwidth));
        self.edges.insert((from, to), id);
        id
    }

    /// 创建双向连接，两个方向拥有各自的传输资源
    pub fn connect_pair(&mut self, u: NodeId, v: NodeId, bandwidth: u64) -> (LinkId, LinkId) {
        (self.connect(u, v, bandwidth), self.connect(v, u, bandwidth))
    }

    /// `node` 及其出边邻居诱导出的子图
    pub fn local_topology(&self, node: NodeId) -> Topology {
        let mut members: Vec<NodeId> = self
            .links
            .iter()
            .filter(|l| l.from == node)
            .map(|l| l.to)
            .collect();
        members.push(node);
        self.links
            .iter()
            .filter(|l| members.contains(&l.from) && members.contains(&l.to))
            .map(|l| (l.from, l.to, l.edge))
            .collect()
    }

    pub fn set_sink(&mut self, sink: Box<dyn DeliverySink>) {
        self.sink = sink;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id())
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeEnv> {
        self.nodes.get(id.0)
    }

    pub fn router(&self, id: NodeId) -> Option<&dyn Router> {
        self.node(id).map(|n| n.router())
    }

    pub fn link(&self, from: NodeId, to: NodeId) -> Option<&Link> {
        let id = self.edges.get(&(from, to))?;
        self.links.get(id.0)
    }

    pub fn process_delay(&self) -> SimTime {
        self.process_delay
    }

    /// 第一个致命错误（若有）
    pub fn failure(&self) -> Option<&RouteError> {
        self.failure.as_ref()
    }

    pub fn take_failure(&mut self) -> Option<RouteError> {
        self.failure.take()
    }

    /// 向所有节点下发 Init，并送达由此产生的全部服务消息
    pub fn start(&mut self, sim: &mut Simulator) {
        for id in 0..self.nodes.len() {
            let result = self.receive(NodeId(id), Message::init(), sim);
            self.settle(result);
        }
        self.flush_service(sim);
    }

    /// 在 `src` 注入一个发往 `dst` 的数据包，返回包 id。
    #[tracing::instrument(skip(self, sim), fields(now = ?sim.now()))]
    pub fn inject(&mut self, src: NodeId, dst: NodeId, size: u32, sim: &mut Simulator) -> u64 {
        let id = self.next_pkg_id;
        self.next_pkg_id = self.next_pkg_id.wrapping_add(1);
        self.stats.injected_pkts += 1;
        debug!(pkg_id = id, "📤 注入数据包");

        let pkg = Package::new(id, size, dst, sim.now());
        let result = self.receive(src, Message::incoming(None, src, Message::pkg(pkg)), sim);
        self.settle(result);
        self.flush_service(sim);
        id
    }

    /// 随机选择源和目的节点注入一个数据包
    pub fn inject_random(
        &mut self,
        sources: &[NodeId],
        dests: &[NodeId],
        size: u32,
        sim: &mut Simulator,
    ) -> Option<u64> {
        let src = *sources.choose(&mut self.rng)?;
        let dst = *dests.choose(&mut self.rng)?;
        Some(self.inject(src, dst, size, sim))
    }

    /// 断开链路：两端各自收到 RemoveLink，在途传输照常完成。
    #[tracing::instrument(skip(self, sim), fields(now = ?sim.now()))]
    pub fn break_link(&mut self, u: NodeId, v: NodeId, sim: &mut Simulator) -> Result<(), RouteError> {
        info!("✂️  断开链路");
        self.mark_link(u, v, false)?;
        let result = [(u, v), (v, u)].into_iter().try_for_each(|(at, peer)| {
            self.receive(
                at,
                Message::RemoveLink {
                    node: peer,
                    direction: Direction::Both,
                },
                sim,
            )
        });
        self.flush_service(sim);
        result
    }

    /// 恢复链路：两端各自收到带原属性的 AddLink。
    #[tracing::instrument(skip(self, sim), fields(now = ?sim.now()))]
    pub fn restore_link(&mut self, u: NodeId, v: NodeId, sim: &mut Simulator) -> Result<(), RouteError> {
        info!("🔗 恢复链路");
        let (uv, vu) = self.mark_link(u, v, true)?;
        let result = [(u, v, uv), (v, u, vu)]
            .into_iter()
            .try_for_each(|(at, peer, edge)| {
                self.receive(
                    at,
                    Message::AddLink {
                        node: peer,
                        direction: Direction::Both,
                        edge,
                    },
                    sim,
                )
            });
        self.flush_service(sim);
        result
    }

    fn mark_link(
        &mut self,
        u: NodeId,
        v: NodeId,
        up: bool,
    ) -> Result<(EdgeData, EdgeData), RouteError> {
        let uv = self.link_id(u, v, u)?;
        let vu = self.link_id(v, u, u)?;
        self.links[uv.0].set_up(up);
        self.links[vu.0].set_up(up);
        Ok((self.links[uv.0].edge, self.links[vu.0].edge))
    }

    fn link_id(&self, from: NodeId, to: NodeId, node: NodeId) -> Result<LinkId, RouteError> {
        self.edges
            .get(&(from, to))
            .copied()
            .ok_or(RouteError::UnknownEdge { node, from, to })
    }

    /// 消息到达节点：数据包先排队占用处理槽，其余消息直接交给路由器。
    #[tracing::instrument(skip(self, msg, sim), fields(kind = msg.kind()))]
    pub(crate) fn receive(
        &mut self,
        to: NodeId,
        msg: Message,
        sim: &mut Simulator,
    ) -> Result<(), RouteError> {
        let node = self
            .nodes
            .get_mut(to.0)
            .ok_or(RouteError::UnknownNode { node: to })?;
        let is_pkg = matches!(&msg, Message::In { inner, .. } if matches!(**inner, Message::Pkg { .. }));
        if is_pkg {
            if node.proc.request(msg) {
                sim.schedule_in(self.process_delay, ProcessDone { node: to });
            } else {
                trace!(queued = node.queued(), "处理槽忙，排队等待");
            }
            return Ok(());
        }
        match msg {
            Message::In { .. }
            | Message::Init { .. }
            | Message::AddLink { .. }
            | Message::RemoveLink { .. } => self.dispatch(to, msg, sim),
            other => Err(RouteError::UnsupportedMessageKind {
                node: to,
                kind: other.kind(),
            }),
        }
    }

    /// 交给路由器处理，并把它发出的消息逐条送出。
    fn dispatch(&mut self, at: NodeId, msg: Message, sim: &mut Simulator) -> Result<(), RouteError> {
        let out = self.nodes[at.0].router.handle(sim.now(), msg)?;
        for m in out {
            self.emit(at, m, sim)?;
        }
        Ok(())
    }

    /// 处理路由器发出的一条消息
    #[tracing::instrument(skip(self, msg, sim), fields(kind = msg.kind()))]
    fn emit(&mut self, at: NodeId, msg: Message, sim: &mut Simulator) -> Result<(), RouteError> {
        match msg {
            Message::Out { from, to, inner } => {
                let link_id = self.link_id(from, to, at)?;
                match *inner {
                    Message::Service { msg } => {
                        self.stats.service_msgs += 1;
                        self.service_queue.push_back((
                            to,
                            Message::incoming(Some(from), to, Message::service(msg)),
                        ));
                        Ok(())
                    }
                    Message::Pkg { pkg } => {
                        self.start_tx(link_id, Message::pkg(pkg), sim);
                        Ok(())
                    }
                    other => Err(RouteError::UnsupportedMessageKind {
                        node: at,
                        kind: other.kind(),
                    }),
                }
            }
            Message::PkgReceived { pkg } => {
                let now = sim.now();
                self.stats.on_delivered(pkg.size, pkg.start_time, now);
                self.sink.record(pkg.start_time, now);
                info!(
                    pkg_id = pkg.id,
                    node = %at,
                    took = now.saturating_sub(pkg.start_time).as_secs_f64(),
                    "✅ 数据包送达目的地"
                );
                Ok(())
            }
            Message::Delayed { id, delay, inner } => {
                let token = self.nodes[at.0].arm_delay(id, *inner);
                sim.schedule_in(
                    delay,
                    DelayExpired {
                        node: at,
                        delay_id: id,
                        token,
                    },
                );
                Ok(())
            }
            Message::InterruptDelay { delay_id } => {
                let (_, inner) = self.nodes[at.0]
                    .delays
                    .remove(&delay_id)
                    .ok_or(RouteError::UnknownDelay { node: at, delay_id })?;
                trace!(delay_id, "⏩ 中断延迟，立即发出");
                self.emit(at, inner, sim)
            }
            other => Err(RouteError::UnsupportedMessageKind {
                node: at,
                kind: other.kind(),
            }),
        }
    }

    fn start_tx(&mut self, link_id: LinkId, msg: Message, sim: &mut Simulator) {
        let link = &mut self.links[link_id.0];
        let bytes = match &msg {
            Message::Pkg { pkg } => pkg.size,
            _ => 0,
        };
        if !link.up {
            warn!(from = %link.from, to = %link.to, "链路已断开，仍接受传输请求");
        }
        let flight = InFlight {
            msg,
            bytes,
            generation: link.generation,
        };
        if link.tx.request(flight) {
            let tx_time = link.tx_time(bytes);
            trace!(link_id = ?link_id, ?tx_time, "开始传输");
            sim.schedule_in(tx_time, LinkReady { link_id });
        } else {
            trace!(link_id = ?link_id, queued = link.queued(), "链路忙，排队等待");
        }
    }

    /// 链路完成一次传输：释放介质、启动下一个等待者，并把数据包交给对端。
    pub(crate) fn on_link_ready(&mut self, link_id: LinkId, sim: &mut Simulator) {
        let link = &mut self.links[link_id.0];
        let Some(done) = link.tx.release() else {
            return;
        };
        let tx_time = link.tx_time(done.bytes);
        link.transmitted_pkts += 1;
        link.busy_time = link.busy_time.saturating_add(tx_time);
        if let Some(next) = link.tx.current() {
            let next_time = link.tx_time(next.bytes);
            sim.schedule_in(next_time, LinkReady { link_id });
        }

        let (from, to) = (link.from, link.to);
        if done.generation != link.generation {
            self.stats.stale_transmissions += 1;
            debug!(from = %from, to = %to, "链路状态已变化，在途数据包照常送达");
        }
        let result = self.receive(to, Message::incoming(Some(from), to, done.msg), sim);
        self.settle(result);
        self.flush_service(sim);
    }

    /// 处理槽释放：启动下一个等待者，并把刚处理完的消息交给路由器。
    pub(crate) fn on_process_done(&mut self, node: NodeId, sim: &mut Simulator) {
        let env = &mut self.nodes[node.0];
        let Some(done) = env.proc.release() else {
            return;
        };
        if env.proc.is_busy() {
            sim.schedule_in(self.process_delay, ProcessDone { node });
        }
        let result = self.dispatch(node, done, sim);
        self.settle(result);
        self.flush_service(sim);
    }

    pub(crate) fn on_delay_expired(
        &mut self,
        node: NodeId,
        delay_id: u64,
        token: u64,
        sim: &mut Simulator,
    ) {
        let Some(msg) = self.nodes[node.0].expire_delay(delay_id, token) else {
            trace!(delay_id, "延迟已被中断");
            return;
        };
        let result = self.emit(node, msg, sim);
        self.settle(result);
        self.flush_service(sim);
    }

    /// 按发出顺序送达待送达的服务消息（以及它们引发的新服务消息）。
    /// 出现致命错误后剩余消息作废。
    fn flush_service(&mut self, sim: &mut Simulator) {
        while let Some((to, msg)) = self.service_queue.pop_front() {
            if self.failure.is_some() {
                self.service_queue.clear();
                return;
            }
            let result = self.receive(to, msg, sim);
            self.settle(result);
        }
    }

    /// 结算一次处理结果：暂时性错误丢弃数据包，致命错误记录下来并停止仿真。
    pub(crate) fn settle(&mut self, result: Result<(), RouteError>) {
        let Err(e) = result else {
            return;
        };
        if e.is_transient() {
            self.stats.dropped_pkts += 1;
            warn!(error = %e, "🗑️  丢弃数据包");
        } else {
            error!(error = %e, "❌ 致命路由错误");
            if self.failure.is_none() {
                self.failure = Some(e);
            }
        }
    }
}
