//! Error types for the TEMPO simulator

use thiserror::Error;

use crate::NodeId;

/// Core TEMPO errors
#[derive(Error, Debug)]
pub enum TempoError {
    // Configuration errors
    #[error("Failed to read config {path}: {detail}")]
    ConfigRead { path: String, detail: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown node id: {0}")]
    UnknownNode(NodeId),

    // Transport errors
    #[error("Bind failed for {addr}: {detail}")]
    Bind { addr: String, detail: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connect attempts exhausted for node {0}")]
    ConnectExhausted(NodeId),

    // Log sink errors
    #[error("Log sink error: {0}")]
    LogSink(String),
}

/// Result type for TEMPO operations
pub type TempoResult<T> = Result<T, TempoError>;
