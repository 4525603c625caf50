//! Replication Wire Protocol
//!
//! Operations travel as a `bincode`-encoded [`ReplicateRequest`] in the body of
//! `POST /_cluster/replicate` (`application/octet-stream`). The receiver answers
//! with a bare status code: `200` when applied (or already applied), otherwise
//! the status of the error that stopped it.

use serde::{Deserialize, Serialize};

use super::types::Operation;
use crate::containers::types::{ContainerId, ContainerSettings};

pub const ENDPOINT_REPLICATE: &str = "/_cluster/replicate";

pub const CONTENT_TYPE_BINARY: &str = "application/octet-stream";

/// One operation addressed to a peer's replica of a container.
///
/// `op_id` is unique per broadcast, so a compensating broadcast is never
/// mistaken for a duplicate of the operation it undoes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateRequest {
    pub op_id: String,
    pub user: String,
    pub container: String,
    /// Container settings of the sender, forwarded untouched.
    pub settings: ContainerSettings,
    pub operation: Operation,
}

impl ReplicateRequest {
    pub fn container_id(&self) -> ContainerId {
        ContainerId::new(&self.user, &self.container)
    }

    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
