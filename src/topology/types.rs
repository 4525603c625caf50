use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeState {
    Alive,
    Suspect,
    Dead,
}

/// Represents a single member of the cluster.
///
/// `failures` counts consecutive failed health probes and drives the
/// `Alive -> Suspect -> Dead` progression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub http_addr: SocketAddr,
    pub state: NodeState,

    #[serde(skip)]
    pub failures: u32,
    #[serde(skip)]
    pub last_seen: Option<Instant>,
}

impl Node {
    pub fn new(id: NodeId, http_addr: SocketAddr) -> Self {
        Self {
            id,
            http_addr,
            state: NodeState::Alive,
            failures: 0,
            last_seen: None,
        }
    }

    /// Base URL used for every request addressed to this node.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.http_addr)
    }
}
