//! TEMPO Test Harness - whole-cluster simulation for validation
//!
//! This crate provides:
//! - `ClusterHarness`: N nodes on loopback with OS-assigned ports,
//!   driven to completion and handed back for inspection
//! - End-to-end tests of the clock law, scheduling, and shutdown
//! - Criterion benchmarks for the clock and queue hot paths

pub mod cluster;

pub use cluster::*;
