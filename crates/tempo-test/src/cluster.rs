//! In-process cluster harness
//!
//! Binds every listener first so the address table carries real OS-assigned
//! ports, then builds the nodes, connects the full mesh, and drives each
//! node's run loop as its own task. `stop` requests shutdown everywhere and
//! returns the finished nodes for inspection.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::task::JoinHandle;

use tempo_clock::TickRate;
use tempo_core::{ClusterConfig, Endpoint, NodeId, ShutdownFlag, TempoResult};
use tempo_net::{ConnectConfig, Listener};
use tempo_node::{EventLog, MemorySink, Node, NodeConfig, NodeStats};

/// Accept poll kept short so harness shutdown is fast
const HARNESS_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A running cluster of in-process nodes
pub struct ClusterHarness {
    members: Vec<Member>,
}

struct Member {
    id: NodeId,
    addr: SocketAddr,
    shutdown: ShutdownFlag,
    sink: MemorySink,
    task: JoinHandle<Node>,
}

/// Snapshot of one node after its loop has finished
pub struct FinishedNode {
    pub id: NodeId,
    pub clock: u64,
    pub stats: NodeStats,
    pub sink: MemorySink,
}

impl ClusterHarness {
    /// Launch nodes "1".."count" at a fixed fast tick rate
    pub async fn launch(count: usize) -> TempoResult<Self> {
        let ids: Vec<String> = (1..=count).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        Self::launch_with(&refs, Some(TickRate::new(6))).await
    }

    /// Launch the given ids; `tick_rate` of `None` samples per node
    pub async fn launch_with(ids: &[&str], tick_rate: Option<TickRate>) -> TempoResult<Self> {
        // Bind everything before anyone connects, so the table is real
        let mut listeners = Vec::new();
        let mut cluster = ClusterConfig::new();
        for id in ids {
            let listener = Listener::bind(&Endpoint::new("127.0.0.1", 0)).await?;
            let port = listener.local_addr().port();
            cluster.insert(NodeId::from(*id), Endpoint::new("127.0.0.1", port));
            listeners.push((NodeId::from(*id), listener));
        }

        let mut members = Vec::new();
        for (id, listener) in listeners {
            let sink = MemorySink::new();
            let log = EventLog::new(id.clone(), Box::new(sink.clone())).with_mirror(false);

            let mut config = NodeConfig::new(id.clone(), cluster.clone());
            config.tick_rate = tick_rate;
            config.poll_interval = HARNESS_POLL_INTERVAL;
            config.connect = ConnectConfig {
                retry_interval: Duration::from_millis(50),
                max_attempts: Some(100),
            };

            let mut node = Node::new(config, log)?;
            let addr = node.start_with_listener(listener);
            node.connect_peers().await?;

            let shutdown = node.shutdown_flag();
            let task = tokio::spawn(async move {
                node.run().await;
                node.shutdown();
                node.wait_for_listener().await;
                node
            });

            members.push(Member {
                id,
                addr,
                shutdown,
                sink,
                task,
            });
        }

        Ok(ClusterHarness { members })
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn addr_of(&self, id: &NodeId) -> Option<SocketAddr> {
        self.members.iter().find(|m| &m.id == id).map(|m| m.addr)
    }

    /// Live view of a node's event log
    pub fn sink_of(&self, id: &NodeId) -> Option<MemorySink> {
        self.members
            .iter()
            .find(|m| &m.id == id)
            .map(|m| m.sink.clone())
    }

    /// Request shutdown everywhere, wait for every loop, return the nodes
    pub async fn stop(self) -> Vec<FinishedNode> {
        for member in &self.members {
            member.shutdown.request();
        }

        let mut finished = Vec::new();
        for member in self.members {
            let node = member.task.await.expect("node task panicked");
            finished.push(FinishedNode {
                id: member.id,
                clock: node.clock_value(),
                stats: node.stats().clone(),
                sink: member.sink,
            });
        }
        finished
    }
}
