//! Outbound peer connections
//!
//! One long-lived stream per (sender, receiver) pair, established during the
//! connect phase and reused for every send. A peer that is not yet listening
//! is retried at a fixed interval; a link that breaks mid-run is never
//! re-established (the failure is logged upstream and the link left as-is).

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use tempo_core::{Endpoint, NodeId, ShutdownFlag, TempoError, TempoResult};

use crate::wire::encode_clock;

/// Fixed delay between connect attempts
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Connect-phase tuning. Defaults preserve the simulation behavior:
/// retry forever, one second apart.
#[derive(Clone, Debug)]
pub struct ConnectConfig {
    pub retry_interval: Duration,
    /// Attempt cap for tests; `None` retries indefinitely
    pub max_attempts: Option<u32>,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        ConnectConfig {
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: None,
        }
    }
}

/// Established outbound connection to one peer
#[derive(Debug)]
pub struct PeerLink {
    stream: TcpStream,
}

impl PeerLink {
    /// Write one `clock:<value>` line to the peer
    pub async fn send_clock(&mut self, value: u64) -> TempoResult<()> {
        self.stream
            .write_all(encode_clock(value).as_bytes())
            .await
            .map_err(|e| TempoError::Transport(e.to_string()))
    }
}

/// Attempt to connect to `peer`, sleeping `retry_interval` between failures.
/// Returns `Ok(None)` when the shutdown flag is observed mid-phase; the
/// transient failures themselves are never surfaced.
pub async fn connect_with_retry(
    peer: &NodeId,
    endpoint: &Endpoint,
    config: &ConnectConfig,
    shutdown: &ShutdownFlag,
) -> TempoResult<Option<PeerLink>> {
    let addr = endpoint.addr();
    let mut attempts = 0u32;
    loop {
        if shutdown.is_requested() {
            return Ok(None);
        }
        match TcpStream::connect(&addr).await {
            Ok(stream) => return Ok(Some(PeerLink { stream })),
            Err(e) => {
                // The failed socket is dropped and closed here
                attempts += 1;
                if let Some(cap) = config.max_attempts {
                    if attempts >= cap {
                        return Err(TempoError::ConnectExhausted(peer.clone()));
                    }
                }
                tracing::debug!(peer = %peer, error = %e, "connect failed; retrying");
                tokio::time::sleep(config.retry_interval).await;
            }
        }
    }
}

/// Connect to every peer in ascending id order. Stops early without error if
/// shutdown is requested during the phase.
pub async fn connect_all(
    peers: &BTreeMap<NodeId, Endpoint>,
    config: &ConnectConfig,
    shutdown: &ShutdownFlag,
) -> TempoResult<BTreeMap<NodeId, PeerLink>> {
    let mut links = BTreeMap::new();
    for (peer, endpoint) in peers {
        match connect_with_retry(peer, endpoint, config, shutdown).await? {
            Some(link) => {
                links.insert(peer.clone(), link);
            }
            None => break,
        }
    }
    Ok(links)
}
