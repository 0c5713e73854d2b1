//! Cluster configuration
//!
//! The core consumes an already-parsed address table mapping node id to
//! host/port. A node derives its peer set as "all entries except self".
//!
//! On disk the table is JSON:
//!
//! ```json
//! {"machines": {"1": {"host": "127.0.0.1", "port": 6001}}}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{NodeId, TempoError, TempoResult};

/// Network endpoint of a single node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
        }
    }

    /// `host:port` form for connect/bind calls
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Address table for the whole cluster, keyed by node id
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub machines: BTreeMap<NodeId, Endpoint>,
}

impl ClusterConfig {
    pub fn new() -> Self {
        ClusterConfig::default()
    }

    /// Load the address table from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> TempoResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| TempoError::ConfigRead {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        Self::from_json(&raw)
    }

    /// Parse the address table from a JSON string
    pub fn from_json(raw: &str) -> TempoResult<Self> {
        serde_json::from_str(raw).map_err(|e| TempoError::InvalidConfig(e.to_string()))
    }

    pub fn insert(&mut self, id: NodeId, endpoint: Endpoint) {
        self.machines.insert(id, endpoint);
    }

    pub fn endpoint(&self, id: &NodeId) -> Option<&Endpoint> {
        self.machines.get(id)
    }

    /// Endpoint for `id`, or an `UnknownNode` error
    pub fn require(&self, id: &NodeId) -> TempoResult<&Endpoint> {
        self.machines
            .get(id)
            .ok_or_else(|| TempoError::UnknownNode(id.clone()))
    }

    /// All entries except `id`, in ascending id order
    pub fn peers_of(&self, id: &NodeId) -> BTreeMap<NodeId, Endpoint> {
        self.machines
            .iter()
            .filter(|(mid, _)| *mid != id)
            .map(|(mid, ep)| (mid.clone(), ep.clone()))
            .collect()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.machines.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}
