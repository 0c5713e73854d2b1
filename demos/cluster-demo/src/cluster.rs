//! Whole-cluster launcher
//!
//! Starts every node from the config in one process, staggered slightly,
//! and stops them all on Ctrl-C. Each node still gets its own log file.

use std::env;
use std::process;
use std::time::Duration;

use tempo_core::{ClusterConfig, TempoResult};
use tempo_node::{EventLog, Node, NodeConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "cluster.json".to_string());

    if let Err(e) = run(&config_path).await {
        eprintln!("cluster failed: {e}");
        process::exit(1);
    }
}

async fn run(config_path: &str) -> TempoResult<()> {
    let cluster = ClusterConfig::from_file(config_path)?;

    let mut flags = Vec::new();
    let mut tasks = Vec::new();
    for id in cluster.node_ids() {
        let log = EventLog::to_file(id.clone(), format!("log_{id}.txt"))?;
        let mut node = Node::new(NodeConfig::new(id, cluster.clone()), log)?;
        node.start().await?;
        flags.push(node.shutdown_flag());

        tasks.push(tokio::spawn(async move {
            // Later nodes may still be binding; the connect phase retries
            if let Err(e) = node.connect_peers().await {
                tracing::warn!(node = %node.id(), error = %e, "connect phase failed");
            }
            node.run().await;
            node.shutdown();
            node.wait_for_listener().await;
        }));

        // Small stagger between launches
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    let _ = tokio::signal::ctrl_c().await;
    println!("\nShutting down all nodes...");
    for flag in &flags {
        flag.request();
    }
    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}
