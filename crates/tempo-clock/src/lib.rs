//! TEMPO Clock Engine - Lamport logical time
//!
//! This crate implements:
//! - The Lamport update rules (internal, send, receive)
//! - `LamportClock`: per-node clock state
//! - `TickRate`: the node's randomly sampled processing speed

pub mod clock;
pub mod rate;

pub use clock::*;
pub use rate::*;
