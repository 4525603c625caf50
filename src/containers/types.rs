use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::ContainerConfig;
use crate::topology::types::{Node, NodeId};

/// Identifying pair of a container. The user part is stored lower-cased so
/// lookups ignore case the same way user comparisons do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId {
    pub user: String,
    pub name: String,
}

impl ContainerId {
    pub fn new(user: &str, name: &str) -> Self {
        Self {
            user: user.to_ascii_lowercase(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.name)
    }
}

/// Opaque per-container settings, forwarded untouched with every replicated operation.
pub type ContainerSettings = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Container {
    pub id: ContainerId,
    pub public_write: bool,
    /// Nodes holding a replica of this container; may include the local node.
    pub owners: Vec<NodeId>,
    pub settings: ContainerSettings,
}

impl Container {
    pub fn new(id: ContainerId) -> Self {
        Self {
            id,
            public_write: false,
            owners: Vec::new(),
            settings: ContainerSettings::new(),
        }
    }

    pub fn with_owners(mut self, owners: Vec<NodeId>) -> Self {
        self.owners = owners;
        self
    }

    pub fn public_write(mut self, public_write: bool) -> Self {
        self.public_write = public_write;
        self
    }

    pub fn is_public_write(&self) -> bool {
        self.public_write
    }

    /// Owners other than `local`, in a stable order.
    pub fn peer_owners(&self, local: &NodeId) -> Vec<NodeId> {
        let mut peers: Vec<NodeId> = self
            .owners
            .iter()
            .filter(|owner| *owner != local)
            .cloned()
            .collect();
        peers.sort();
        peers.dedup();
        peers
    }
}

impl From<&ContainerConfig> for Container {
    fn from(config: &ContainerConfig) -> Self {
        Self {
            id: ContainerId::new(&config.user, &config.name),
            public_write: config.public_write,
            owners: config.owners.iter().map(|o| NodeId(o.clone())).collect(),
            settings: config.settings.clone(),
        }
    }
}

/// Outcome of looking up where a container lives.
#[derive(Debug, Clone)]
pub enum Resolution {
    Local(Container),
    /// Non-empty, ordered by node id. Callers redirect to the first entry.
    Remote(Vec<Node>),
    NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub timestamp_ms: u64,
    pub user: Option<String>,
    pub operation: String,
    pub key: String,
    pub detail: Option<String>,
}

impl AuditEntry {
    /// Entry stamped with the current wall-clock time.
    pub fn now(user: Option<&str>, operation: &str, key: &str, detail: Option<String>) -> Self {
        Self {
            timestamp_ms: now_ms(),
            user: user.map(str::to_string),
            operation: operation.to_string(),
            key: key.to_string(),
            detail,
        }
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Listing entry returned when container statistics are requested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContainerSummary {
    pub user: String,
    pub name: String,
    pub public_write: bool,
    pub owners: Vec<NodeId>,
    pub settings: ContainerSettings,
    pub object_count: usize,
    pub total_bytes: u64,
}
