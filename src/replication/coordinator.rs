use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::protocol::{CONTENT_TYPE_BINARY, ENDPOINT_REPLICATE, ReplicateRequest};
use super::types::{Operation, ReplicationError};
use crate::containers::types::Container;
use crate::topology::service::ClusterTopology;
use crate::topology::types::{Node, NodeId, NodeState};

/// Fans an already applied operation out to the other owners of a container.
#[async_trait]
pub trait Replicator: Send + Sync {
    /// Succeeds only when every peer owner acknowledged. Does not retry.
    async fn replicate(
        &self,
        container: &Container,
        operation: &Operation,
    ) -> Result<(), ReplicationError>;
}

/// Replicator that posts operations to peers over HTTP.
///
/// Peers are contacted one at a time in node-id order, each with a single
/// attempt bounded by `timeout`. A peer missing from the topology, known to be
/// dead, timing out or answering with a non-2xx status counts as failed.
pub struct HttpReplicator {
    topology: Arc<ClusterTopology>,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpReplicator {
    pub fn new(topology: Arc<ClusterTopology>, timeout: Duration) -> Self {
        Self {
            topology,
            http_client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn send(&self, node: &Node, body: Vec<u8>) -> Result<()> {
        if node.state == NodeState::Dead {
            return Err(anyhow!("node is marked dead"));
        }

        let url = format!("{}{}", node.base_url(), ENDPOINT_REPLICATE);
        let response = self
            .http_client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE_BINARY)
            .body(body)
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!("peer answered {}", response.status()))
        }
    }
}

#[async_trait]
impl Replicator for HttpReplicator {
    async fn replicate(
        &self,
        container: &Container,
        operation: &Operation,
    ) -> Result<(), ReplicationError> {
        let targets = container.peer_owners(self.topology.local_id());
        if targets.is_empty() {
            return Ok(());
        }

        let request = ReplicateRequest {
            op_id: uuid::Uuid::new_v4().to_string(),
            user: container.id.user.clone(),
            container: container.id.name.clone(),
            settings: container.settings.clone(),
            operation: operation.clone(),
        };
        let body = match request.encode() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to encode {} for {}: {}", operation.name(), container.id, e);
                return Err(ReplicationError::PartialFailure(targets));
            }
        };

        let mut failed: Vec<NodeId> = Vec::new();
        for target in targets {
            let outcome = match self.topology.get_member(&target) {
                Some(node) => self.send(&node, body.clone()).await,
                None => Err(anyhow!("node is not part of the topology")),
            };

            match outcome {
                Ok(()) => debug!(
                    "Replicated {} ({}) on {} to {}",
                    operation.name(),
                    request.op_id,
                    container.id,
                    target
                ),
                Err(e) => {
                    warn!(
                        "Replication of {} on {} to {} failed: {}",
                        operation.name(),
                        container.id,
                        target,
                        e
                    );
                    failed.push(target);
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ReplicationError::PartialFailure(failed))
        }
    }
}
