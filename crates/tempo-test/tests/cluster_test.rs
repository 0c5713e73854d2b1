//! End-to-end tests for the node runtime: clock law across the wire,
//! scheduling behavior, failure tolerance, and shutdown.

use std::time::Duration;

use tokio::net::TcpStream;

use tempo_clock::TickRate;
use tempo_core::{ClusterConfig, Endpoint, EventKind, NodeId, TempoError};
use tempo_net::{ConnectConfig, InboundQueue, Listener};
use tempo_node::{Action, EventLog, MemorySink, Node, NodeConfig, ScriptedPolicy};
use tempo_test::ClusterHarness;

const POLL: Duration = Duration::from_millis(50);

async fn wait_for_queue(queue: &InboundQueue, len: usize) {
    for _ in 0..100 {
        if queue.len() >= len {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("queue never reached {} entries", len);
}

fn fast_connect() -> ConnectConfig {
    ConnectConfig {
        retry_interval: Duration::from_millis(20),
        max_attempts: Some(50),
    }
}

/// Bind one listener per id and return it with the finished address table
async fn bound_cluster(ids: &[&str]) -> (Vec<(NodeId, Listener)>, ClusterConfig) {
    let mut listeners = Vec::new();
    let mut cluster = ClusterConfig::new();
    for id in ids {
        let listener = Listener::bind(&Endpoint::new("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().port();
        cluster.insert(NodeId::from(*id), Endpoint::new("127.0.0.1", port));
        listeners.push((NodeId::from(*id), listener));
    }
    (listeners, cluster)
}

fn scripted_node(
    id: &str,
    cluster: ClusterConfig,
    script: impl IntoIterator<Item = Action>,
) -> (Node, MemorySink) {
    let sink = MemorySink::new();
    let log = EventLog::new(NodeId::from(id), Box::new(sink.clone())).with_mirror(false);
    let mut config = NodeConfig::new(NodeId::from(id), cluster);
    config.tick_rate = Some(TickRate::new(6));
    config.poll_interval = POLL;
    config.connect = fast_connect();
    let node = Node::with_policy(config, log, Box::new(ScriptedPolicy::new(script))).unwrap();
    (node, sink)
}

#[tokio::test(flavor = "multi_thread")]
async fn two_nodes_follow_the_receive_law() {
    let (mut listeners, cluster) = bound_cluster(&["a", "b"]).await;
    let (b_id, b_listener) = listeners.pop().unwrap();
    let (_a_id, a_listener) = listeners.pop().unwrap();
    assert_eq!(b_id, NodeId::from("b"));

    // A: one internal step, then a send; B: internal steps only
    let (mut a, a_sink) =
        scripted_node("a", cluster.clone(), [Action::Internal, Action::SendTo(0)]);
    let (mut b, b_sink) = scripted_node("b", cluster, []);

    a.start_with_listener(a_listener);
    b.start_with_listener(b_listener);
    a.connect_peers().await.unwrap();

    // B does two internal ticks first: B_before = 2
    b.step().await;
    b.step().await;
    assert_eq!(b.clock_value(), 2);

    // A: internal tick (clock 1), then send, transmitting N+1 = 2
    a.step().await;
    a.step().await;
    assert_eq!(a.clock_value(), 2);
    assert!(a_sink.contains_kind(EventKind::Send));

    // B drains: max(2, 2) + 1 = 3
    wait_for_queue(&b.queue(), 1).await;
    b.step().await;
    assert_eq!(b.clock_value(), 3);
    assert_eq!(b.stats().receives, 1);

    let receive_line = b_sink
        .lines()
        .into_iter()
        .find(|l| l.contains(" | RECEIVE | "))
        .unwrap();
    assert!(receive_line.contains("message clock: 2, queue length: 0"));

    a.shutdown();
    b.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn broadcast_raises_the_clock_once_per_peer() {
    let (mut listeners, cluster) = bound_cluster(&["1", "2", "3"]).await;
    let (_, l3) = listeners.pop().unwrap();
    let (_, l2) = listeners.pop().unwrap();
    let (_, l1) = listeners.pop().unwrap();

    let (mut n1, sink) = scripted_node("1", cluster.clone(), [Action::Broadcast]);
    let (mut n2, _) = scripted_node("2", cluster.clone(), []);
    let (mut n3, _) = scripted_node("3", cluster, []);

    n1.start_with_listener(l1);
    n2.start_with_listener(l2);
    n3.start_with_listener(l3);
    n1.connect_peers().await.unwrap();

    n1.step().await;

    // Two sequential sends, each incrementing independently
    assert_eq!(n1.clock_value(), 2);
    assert_eq!(n1.stats().sends, 2);
    assert_eq!(sink.count_kind(EventKind::Send), 2);

    // Ascending id order: "2" got the first stamp, "3" the second
    wait_for_queue(&n2.queue(), 1).await;
    wait_for_queue(&n3.queue(), 1).await;
    assert_eq!(n2.queue().pop(), Some(1));
    assert_eq!(n3.queue().pop(), Some(2));

    n1.shutdown();
    n2.shutdown();
    n3.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn second_rank_falls_back_to_the_only_peer() {
    let (mut listeners, cluster) = bound_cluster(&["1", "2"]).await;
    let (_, l2) = listeners.pop().unwrap();
    let (_, l1) = listeners.pop().unwrap();

    // Rank 1 drawn with a single peer: the send goes to "2" anyway
    let (mut n1, sink) = scripted_node("1", cluster.clone(), [Action::SendTo(1)]);
    let (mut n2, _) = scripted_node("2", cluster, []);

    n1.start_with_listener(l1);
    n2.start_with_listener(l2);
    n1.connect_peers().await.unwrap();

    n1.step().await;
    assert_eq!(n1.stats().sends, 1);
    assert!(sink
        .lines()
        .iter()
        .any(|l| l.contains("sent to node 2")));

    wait_for_queue(&n2.queue(), 1).await;
    assert_eq!(n2.queue().pop(), Some(1));

    n1.shutdown();
    n2.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_peer_node_logs_internal_only() {
    let harness = ClusterHarness::launch_with(&["solo"], Some(TickRate::new(6)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    let finished = harness.stop().await;
    let node = &finished[0];

    assert!(node.stats.internals > 0);
    assert!(node.sink.contains_kind(EventKind::Internal));
    assert!(!node.sink.contains_kind(EventKind::Send));
    assert!(!node.sink.contains_kind(EventKind::Receive));
}

#[tokio::test(flavor = "multi_thread")]
async fn send_failure_is_logged_and_does_not_halt_the_node() {
    let (mut listeners, cluster) = bound_cluster(&["1"]).await;
    let (_, l1) = listeners.pop().unwrap();

    // "2" is a bare socket we accept and then slam shut
    let remote = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut cluster = cluster;
    cluster.insert(
        NodeId::from("2"),
        Endpoint::new("127.0.0.1", remote.local_addr().unwrap().port()),
    );

    let (mut n1, sink) = scripted_node("1", cluster, []);
    n1.start_with_listener(l1);
    n1.connect_peers().await.unwrap();

    let (accepted, _) = remote.accept().await.unwrap();
    drop(accepted);
    drop(remote);

    // The first write may land in the OS buffer; keep sending until the
    // broken pipe surfaces
    let peer = NodeId::from("2");
    for _ in 0..20 {
        n1.send_to(&peer).await;
        if n1.stats().send_errors > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(n1.stats().send_errors > 0);
    assert!(sink
        .lines()
        .iter()
        .any(|l| l.contains("failed to send to node 2")));

    // The scheduler keeps going
    let clock_before = n1.clock_value();
    n1.step().await;
    assert_eq!(n1.clock_value(), clock_before + 1);

    n1.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_twice_closes_everything_once() {
    let (mut listeners, cluster) = bound_cluster(&["1", "2"]).await;
    let (_, l2) = listeners.pop().unwrap();
    let (_, l1) = listeners.pop().unwrap();

    let (mut n1, _) = scripted_node("1", cluster.clone(), []);
    let (mut n2, _) = scripted_node("2", cluster, []);
    let addr = n1.start_with_listener(l1);
    n2.start_with_listener(l2);
    n1.connect_peers().await.unwrap();
    assert_eq!(n1.link_count(), 1);

    n1.shutdown();
    n1.shutdown();
    assert_eq!(n1.link_count(), 0);

    // Accept loop observes the flag and releases the socket
    n1.wait_for_listener().await;
    assert!(TcpStream::connect(addr).await.is_err());

    n2.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_phase_can_be_reinvoked_later() {
    let (mut listeners, mut cluster) = bound_cluster(&["1"]).await;
    let (_, l1) = listeners.pop().unwrap();

    // Reserve a port for "2", then free it so the first phase is refused
    let reserved = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = reserved.local_addr().unwrap().port();
    drop(reserved);
    cluster.insert(NodeId::from("2"), Endpoint::new("127.0.0.1", port));

    let sink = MemorySink::new();
    let log = EventLog::new(NodeId::from("1"), Box::new(sink.clone())).with_mirror(false);
    let mut config = NodeConfig::new(NodeId::from("1"), cluster);
    config.tick_rate = Some(TickRate::new(6));
    config.connect = ConnectConfig {
        retry_interval: Duration::from_millis(20),
        max_attempts: Some(2),
    };
    let mut node = Node::new(config, log).unwrap();
    node.start_with_listener(l1);

    let err = node.connect_peers().await.unwrap_err();
    assert!(matches!(err, TempoError::ConnectExhausted(_)));
    assert_eq!(node.link_count(), 0);

    // Peer comes up on the advertised port; re-invocation picks it up
    let _peer = tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    node.connect_peers().await.unwrap();
    assert_eq!(node.link_count(), 1);

    node.shutdown();
}
