//! Node configuration.
//!
//! A node is described by a single JSON document: its own identity, the peers it
//! can talk to, request limits, replication and health-probe tuning, the API-key
//! table used for authentication, and the containers this node holds. Every
//! section falls back to defaults so a bare `{}` is a valid single-node config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::auth::Permissions;

/// Default upper bound for a single request payload: 64 MiB.
const DEFAULT_MAX_TRANSFER_SIZE: u64 = 64 * 1024 * 1024;
const DEFAULT_REPLICATION_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_HEALTH_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node: LocalNodeConfig,
    pub peers: Vec<PeerConfig>,
    pub server: ServerConfig,
    pub replication: ReplicationConfig,
    pub health: HealthConfig,
    pub users: Vec<UserConfig>,
    pub containers: Vec<ContainerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalNodeConfig {
    /// Stable node identifier. Generated at startup when absent.
    pub id: Option<String>,
    pub bind: SocketAddr,
}

impl Default for LocalNodeConfig {
    fn default() -> Self {
        Self {
            id: None,
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    pub id: String,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Largest request payload (in bytes) accepted by write operations.
    pub max_transfer_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_transfer_size: DEFAULT_MAX_TRANSFER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    pub timeout_ms: u64,
}

impl ReplicationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_REPLICATION_TIMEOUT_MS,
        }
    }
}

/// Peer health probing.
///
/// A peer becomes `Suspect` after `suspect_after` consecutive failed probes and
/// `Dead` after `dead_after`; one successful probe restores it to `Alive`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub interval_ms: u64,
    pub suspect_after: u32,
    pub dead_after: u32,
}

impl HealthConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_HEALTH_INTERVAL_MS,
            suspect_after: 2,
            dead_after: 5,
        }
    }
}

/// One entry of the API-key table.
///
/// `permissions: None` means the key is unrestricted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub api_key: String,
    pub user: String,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

/// A container held by this node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub user: String,
    pub name: String,
    #[serde(default)]
    pub public_write: bool,
    /// Every node holding a replica, this node included.
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub key_values: BTreeMap<String, String>,
}

impl NodeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: NodeConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.max_transfer_size == 0 {
            anyhow::bail!("server.max_transfer_size must be greater than zero");
        }
        if self.health.interval_ms == 0 {
            anyhow::bail!("health.interval_ms must be greater than zero");
        }
        if self.health.suspect_after == 0 {
            anyhow::bail!("health.suspect_after must be at least 1");
        }
        if self.health.dead_after < self.health.suspect_after {
            anyhow::bail!("health.dead_after must not be lower than health.suspect_after");
        }
        if let Some(id) = &self.node.id
            && self.peers.iter().any(|peer| &peer.id == id)
        {
            anyhow::bail!("node id {} is also listed as a peer", id);
        }
        Ok(())
    }
}
