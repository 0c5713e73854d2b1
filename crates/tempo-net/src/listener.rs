//! Inbound connection handling
//!
//! The listener accepts with a bounded poll so the shutdown flag is observed
//! without blocking indefinitely. Every accepted connection gets its own
//! reader task that parses `clock:<n>` lines into the inbound queue and exits
//! when the stream closes. Stream order is what preserves FIFO per peer.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use tempo_core::{Endpoint, ShutdownFlag, TempoError, TempoResult};

use crate::queue::InboundQueue;
use crate::wire::parse_clock_line;

/// How long one accept attempt may block before re-checking the stop flag
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Listening socket for a node
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to the node's configured address
    pub async fn bind(endpoint: &Endpoint) -> TempoResult<Self> {
        let addr = endpoint.addr();
        let inner = TcpListener::bind(&addr)
            .await
            .map_err(|e| TempoError::Bind {
                addr: addr.clone(),
                detail: e.to_string(),
            })?;
        let local_addr = inner.local_addr().map_err(|e| TempoError::Bind {
            addr,
            detail: e.to_string(),
        })?;
        Ok(Listener { inner, local_addr })
    }

    /// Actual bound address (resolves OS-assigned ports)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start the accept loop. An accept timeout is control flow, not an
    /// error; accept errors are logged and the loop continues. The loop exits
    /// once the shutdown flag is set, dropping (closing) the socket.
    pub fn spawn_accept_loop(
        self,
        queue: InboundQueue,
        shutdown: ShutdownFlag,
        poll_interval: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while !shutdown.is_requested() {
                match timeout(poll_interval, self.inner.accept()).await {
                    // Poll expired; go re-check the stop flag
                    Err(_) => continue,
                    Ok(Ok((stream, _addr))) => {
                        tokio::spawn(read_clock_lines(stream, queue.clone()));
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("accept error: {}", e);
                    }
                }
            }
        })
    }
}

/// Reader task for one inbound connection. Lines that do not parse as
/// `clock:<integer>` are dropped silently.
async fn read_clock_lines(stream: TcpStream, queue: InboundQueue) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(value) = parse_clock_line(&line) {
            queue.push(value);
        }
    }
}
