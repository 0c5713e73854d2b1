//! TEMPO Network Layer - persistent point-to-point TCP plumbing
//!
//! This crate provides:
//! - The `clock:<n>` wire line format
//! - `InboundQueue`: thread-safe FIFO bridging reader tasks to the scheduler
//! - `Listener`: bounded-poll accept loop, one reader task per connection
//! - `PeerLink` and the fixed-interval connect-retry phase

pub mod connector;
pub mod listener;
pub mod queue;
pub mod wire;

pub use connector::*;
pub use listener::*;
pub use queue::*;
pub use wire::*;
