//! Single-node launcher
//!
//! Runs one simulated node until Ctrl-C, appending its events to
//! `log_<id>.txt`. The node id is required; the config path defaults to
//! `cluster.json`.

use std::env;
use std::process;

use tempo_core::{ClusterConfig, NodeId, TempoResult};
use tempo_node::{EventLog, Node, NodeConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let Some(id) = args.next() else {
        eprintln!("Usage: node <node-id> [config-path]");
        process::exit(1);
    };
    let config_path = args.next().unwrap_or_else(|| "cluster.json".to_string());

    if let Err(e) = run(NodeId::new(id), &config_path).await {
        eprintln!("node failed: {e}");
        process::exit(1);
    }
}

async fn run(id: NodeId, config_path: &str) -> TempoResult<()> {
    let cluster = ClusterConfig::from_file(config_path)?;
    let log = EventLog::to_file(id.clone(), format!("log_{id}.txt"))?;
    let mut node = Node::new(NodeConfig::new(id, cluster), log)?;

    node.start().await?;
    node.connect_peers().await?;

    let shutdown = node.shutdown_flag();
    let loop_task = tokio::spawn(async move {
        node.run().await;
        node
    });

    // Ctrl-C requests a cooperative stop; the loop observes the flag
    let _ = tokio::signal::ctrl_c().await;
    println!("Node shutting down.");
    shutdown.request();

    let mut node = loop_task.await.expect("node task panicked");
    node.shutdown();
    node.wait_for_listener().await;
    Ok(())
}
