//! TEMPO Core - shared types and primitives
//!
//! This crate provides:
//! - Node identity
//! - Event taxonomy for the per-node event log
//! - Error types
//! - Cluster address-table configuration
//! - Cooperative shutdown flag

pub mod config;
pub mod error;
pub mod event;
pub mod id;
pub mod shutdown;

pub use config::*;
pub use error::*;
pub use event::*;
pub use id::*;
pub use shutdown::*;
