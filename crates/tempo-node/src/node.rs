//! Node aggregate and runtime loop

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use tempo_clock::{LamportClock, TickRate};
use tempo_core::{ClusterConfig, Endpoint, EventKind, NodeId, ShutdownFlag, TempoResult};
use tempo_net::{
    connect_all, ConnectConfig, InboundQueue, Listener, PeerLink, DEFAULT_POLL_INTERVAL,
};

use crate::eventlog::EventLog;
use crate::scheduler::{Action, ActionPolicy, UniformPolicy};

/// Node configuration
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// This node's id; must be present in the cluster table
    pub id: NodeId,
    /// Address table for the whole cluster
    pub cluster: ClusterConfig,
    /// Fixed tick rate; sampled uniformly from [1,6] when absent
    pub tick_rate: Option<TickRate>,
    /// Bounded accept wait for the listener
    pub poll_interval: Duration,
    /// Connect-phase retry tuning
    pub connect: ConnectConfig,
}

impl NodeConfig {
    pub fn new(id: NodeId, cluster: ClusterConfig) -> Self {
        NodeConfig {
            id,
            cluster,
            tick_rate: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect: ConnectConfig::default(),
        }
    }
}

/// Counters for one node's run
#[derive(Clone, Debug, Default)]
pub struct NodeStats {
    pub ticks: u64,
    pub receives: u64,
    pub sends: u64,
    pub internals: u64,
    pub send_errors: u64,
}

/// A single simulated node: owns its sockets, queue, clock, and log
pub struct Node {
    id: NodeId,
    endpoint: Endpoint,
    peers: BTreeMap<NodeId, Endpoint>,
    rate: TickRate,
    clock: LamportClock,
    queue: InboundQueue,
    links: BTreeMap<NodeId, PeerLink>,
    shutdown: ShutdownFlag,
    policy: Box<dyn ActionPolicy>,
    log: EventLog,
    stats: NodeStats,
    poll_interval: Duration,
    connect: ConnectConfig,
    local_addr: Option<SocketAddr>,
    listener_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("peers", &self.peers)
            .field("rate", &self.rate)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Create a node with the simulation's uniform action policy
    pub fn new(config: NodeConfig, log: EventLog) -> TempoResult<Self> {
        Self::with_policy(config, log, Box::new(UniformPolicy::new()))
    }

    /// Create a node with an injected action policy
    pub fn with_policy(
        config: NodeConfig,
        mut log: EventLog,
        policy: Box<dyn ActionPolicy>,
    ) -> TempoResult<Self> {
        let endpoint = config.cluster.require(&config.id)?.clone();
        let peers = config.cluster.peers_of(&config.id);
        let rate = config
            .tick_rate
            .unwrap_or_else(|| TickRate::sample(&mut rand::thread_rng()));
        log.write_header(rate);

        Ok(Node {
            id: config.id,
            endpoint,
            peers,
            rate,
            clock: LamportClock::new(),
            queue: InboundQueue::new(),
            links: BTreeMap::new(),
            shutdown: ShutdownFlag::new(),
            policy,
            log,
            stats: NodeStats::default(),
            poll_interval: config.poll_interval,
            connect: config.connect,
            local_addr: None,
            listener_task: None,
        })
    }

    /// Bind the configured address and start the accept loop
    pub async fn start(&mut self) -> TempoResult<SocketAddr> {
        let listener = Listener::bind(&self.endpoint).await?;
        Ok(self.start_with_listener(listener))
    }

    /// Start the accept loop on a pre-bound listener. The harness binds
    /// OS-assigned ports before the address table is final.
    pub fn start_with_listener(&mut self, listener: Listener) -> SocketAddr {
        let addr = listener.local_addr();
        self.local_addr = Some(addr);
        let handle =
            listener.spawn_accept_loop(self.queue.clone(), self.shutdown.clone(), self.poll_interval);
        self.listener_task = Some(handle);
        addr
    }

    /// Establish outbound links to every peer not linked yet, retrying per
    /// the connect config. Safe to invoke again later for peers missed in an
    /// earlier phase.
    pub async fn connect_peers(&mut self) -> TempoResult<()> {
        let missing: BTreeMap<NodeId, Endpoint> = self
            .peers
            .iter()
            .filter(|(id, _)| !self.links.contains_key(*id))
            .map(|(id, ep)| (id.clone(), ep.clone()))
            .collect();
        let links = connect_all(&missing, &self.connect, &self.shutdown).await?;
        self.links.extend(links);
        Ok(())
    }

    /// One tick: drain exactly one queued message, or consult the policy
    pub async fn step(&mut self) {
        self.stats.ticks += 1;

        if let Some(received) = self.queue.pop() {
            let updated = self.clock.observe(received);
            self.stats.receives += 1;
            let depth = self.queue.len();
            self.log.record(
                EventKind::Receive,
                updated,
                &format!("message clock: {received}, queue length: {depth}"),
            );
            return;
        }

        let action = if self.peers.is_empty() {
            // Nothing to address; every draw degrades to an internal step
            Action::Internal
        } else {
            self.policy.next_action()
        };

        match action {
            Action::SendTo(rank) => {
                if let Some(peer) = self.peer_at(rank) {
                    self.send_to(&peer).await;
                }
            }
            Action::Broadcast => self.broadcast().await,
            Action::Internal => {
                let value = self.clock.advance();
                self.stats.internals += 1;
                self.log.record(EventKind::Internal, value, "internal event");
            }
        }
    }

    /// Scheduler loop: tick until the stop flag is observed, sleeping out
    /// the remainder of each tick period
    pub async fn run(&mut self) {
        let period = self.rate.period();
        while !self.shutdown.is_requested() {
            let started = Instant::now();
            self.step().await;
            let elapsed = started.elapsed();
            if elapsed < period {
                tokio::time::sleep(period - elapsed).await;
            }
        }
    }

    /// Send the stamped clock to one peer. An unknown or unconnected peer
    /// leaves the clock untouched; a transmission failure does not (the
    /// clock was already stamped) and never propagates.
    pub async fn send_to(&mut self, peer: &NodeId) {
        let Some(link) = self.links.get_mut(peer) else {
            self.stats.send_errors += 1;
            let clock = self.clock.now();
            self.log
                .record(EventKind::Error, clock, &format!("no connection to node {peer}"));
            return;
        };

        let stamped = self.clock.stamp_send();
        match link.send_clock(stamped).await {
            Ok(()) => {
                self.stats.sends += 1;
                self.log
                    .record(EventKind::Send, stamped, &format!("sent to node {peer}"));
            }
            Err(e) => {
                self.stats.send_errors += 1;
                self.log.record(
                    EventKind::Error,
                    stamped,
                    &format!("failed to send to node {peer}: {e}"),
                );
            }
        }
    }

    /// Send to every peer in ascending id order; each send increments the
    /// clock independently
    pub async fn broadcast(&mut self) {
        let peers: Vec<NodeId> = self.peers.keys().cloned().collect();
        for peer in peers {
            self.send_to(&peer).await;
        }
    }

    /// Stop the node: set the flag and drop every outbound link. Idempotent.
    /// The accept loop observes the flag within its poll interval and
    /// releases the listening socket.
    pub fn shutdown(&mut self) {
        self.shutdown.request();
        self.links.clear();
    }

    /// Wait for the accept loop to exit after `shutdown`
    pub async fn wait_for_listener(&mut self) {
        if let Some(handle) = self.listener_task.take() {
            let _ = handle.await;
        }
    }

    fn peer_at(&self, rank: usize) -> Option<NodeId> {
        if self.peers.is_empty() {
            return None;
        }
        // Out-of-range ranks fall back to the smallest peer
        let idx = rank.min(self.peers.len() - 1);
        self.peers.keys().nth(idx).cloned()
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn clock_value(&self) -> u64 {
        self.clock.now()
    }

    pub fn rate(&self) -> TickRate {
        self.rate
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    /// Handle for external shutdown requests (signal handlers, harnesses)
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Handle to the inbound queue
    pub fn queue(&self) -> InboundQueue {
        self.queue.clone()
    }

    /// Actual listening address once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn peer_ids(&self) -> Vec<NodeId> {
        self.peers.keys().cloned().collect()
    }

    /// Number of established outbound links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}
