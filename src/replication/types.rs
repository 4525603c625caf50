use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::ErrorCode;
use crate::objects::types::RangeWrite;
use crate::topology::types::NodeId;

/// A mutation of one container, as applied locally and shipped to peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Create {
        key: String,
        content_type: String,
        data: Vec<u8>,
    },
    Rename {
        key: String,
        new_key: String,
    },
    WriteRange {
        key: String,
        write: RangeWrite,
    },
    DeleteObject {
        key: String,
    },
    DeleteContainer,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::Rename { .. } => "rename",
            Operation::WriteRange { .. } => "write_range",
            Operation::DeleteObject { .. } => "delete_object",
            Operation::DeleteContainer => "delete_container",
        }
    }

    /// Object keys touched by the operation; these are the keys to lock.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Operation::Create { key, .. }
            | Operation::WriteRange { key, .. }
            | Operation::DeleteObject { key } => vec![key.as_str()],
            Operation::Rename { key, new_key } => vec![key.as_str(), new_key.as_str()],
            Operation::DeleteContainer => Vec::new(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplicationError {
    /// Peers that did not acknowledge, in the order they were contacted.
    #[error("replication failed on {} peer(s): {:?}", .0.len(), .0)]
    PartialFailure(Vec<NodeId>),
}

impl ReplicationError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::ReplicationFailure
    }

    pub fn failed_peers(&self) -> &[NodeId] {
        match self {
            ReplicationError::PartialFailure(peers) => peers,
        }
    }
}
