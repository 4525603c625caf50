use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::protocol::{ENDPOINT_CONTAINERS_INTERNAL, owner_probe_url};
use super::registry::ContainerRegistry;
use super::types::{AuditEntry, Container, ContainerId};
use crate::topology::service::ClusterTopology;
use crate::topology::types::Node;

/// Where containers are looked up.
///
/// `get_container` answers for this node only; `find_owners` asks the rest of
/// the cluster.
#[async_trait]
pub trait ContainerDirectory: Send + Sync {
    fn get_container(&self, id: &ContainerId) -> Option<Container>;

    /// Peers that report holding the container.
    async fn find_owners(&self, id: &ContainerId) -> Vec<Node>;

    fn record_audit(&self, id: &ContainerId, entry: AuditEntry);
}

/// Directory backed by the local registry and the peers in the topology.
pub struct ClusterDirectory {
    registry: Arc<ContainerRegistry>,
    topology: Arc<ClusterTopology>,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl ClusterDirectory {
    pub fn new(
        registry: Arc<ContainerRegistry>,
        topology: Arc<ClusterTopology>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            topology,
            http_client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn peer_holds(&self, node: &Node, id: &ContainerId) -> Result<bool> {
        let url = owner_probe_url(node, id)?;
        let response = self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(anyhow!(
                "{} lookup on {} failed: {}",
                ENDPOINT_CONTAINERS_INTERNAL,
                node.id,
                status
            )),
        }
    }
}

#[async_trait]
impl ContainerDirectory for ClusterDirectory {
    fn get_container(&self, id: &ContainerId) -> Option<Container> {
        self.registry.get(id)
    }

    async fn find_owners(&self, id: &ContainerId) -> Vec<Node> {
        let mut owners = Vec::new();

        for node in self.topology.reachable_peers() {
            match self.peer_holds(&node, id).await {
                Ok(true) => owners.push(node),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Owner lookup for {} on {} failed: {}", id, node.id, e);
                }
            }
        }

        owners
    }

    fn record_audit(&self, id: &ContainerId, entry: AuditEntry) {
        if !self.registry.append_audit(id, entry) {
            tracing::debug!("Audit entry dropped, container {} no longer held", id);
        }
    }
}
