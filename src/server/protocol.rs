//! Client-facing query parameters and response bodies.

use serde::{Deserialize, Serialize};

use crate::topology::types::{NodeId, NodeState};

/// Query of `PUT /{user}/{container}/{*key}`.
///
/// The offset is kept as text so a malformed value is reported with the
/// node's own error envelope.
#[derive(Debug, Default, Deserialize)]
pub struct WriteQuery {
    pub rename: Option<String>,
    pub offset: Option<String>,
}

/// Query of `DELETE /{user}/{container}`. At most one flag is honoured,
/// `audit_log` first.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub audit_log: bool,
    #[serde(default)]
    pub keys: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub stats: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub node_id: NodeId,
    pub state: NodeState,
}
