//! Cooperative shutdown flag
//!
//! Every loop in the node (listener accept poll, scheduler tick, connect
//! retry) checks this flag rather than being forcibly interrupted. Handles
//! are cheap clones sharing one atomic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag for a node's tasks
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        ShutdownFlag::default()
    }

    /// Request shutdown. Idempotent; returns whether this call flipped the flag.
    pub fn request(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
