//! TEMPO Node Runtime - the per-tick scheduling loop
//!
//! Each tick of a node:
//! 1. Observe the stop flag
//! 2. Drain exactly one queued message, if any (RECEIVE)
//! 3. Otherwise draw an action from the policy: send, broadcast, or internal
//! 4. Sleep out the remainder of the tick period
//!
//! The node aggregate owns the listener, the outbound links, the inbound
//! queue, the Lamport clock, and the event log.

pub mod eventlog;
pub mod node;
pub mod scheduler;

pub use eventlog::*;
pub use node::*;
pub use scheduler::*;
