//! Redirect Builder
//!
//! When a container is owned elsewhere the node answers with a redirect to
//! the owner instead of proxying. The client re-issues the request itself.

use axum::http::StatusCode;

use crate::topology::types::{Node, NodeId};

/// Status used for every redirect. 307 keeps the method and body on the second hop.
pub const REDIRECT_STATUS: StatusCode = StatusCode::TEMPORARY_REDIRECT;

/// The part of the inbound request needed to rebuild it against another node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    /// Path plus query string exactly as received, e.g. `/alice/docs/a.txt?offset=3`.
    pub path_and_query: String,
}

impl RequestOrigin {
    pub fn new(path_and_query: impl Into<String>) -> Self {
        Self {
            path_and_query: path_and_query.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
    pub node_id: NodeId,
}

impl Redirect {
    pub fn status(&self) -> StatusCode {
        REDIRECT_STATUS
    }
}

pub struct RedirectBuilder;

impl RedirectBuilder {
    pub fn build(origin: &RequestOrigin, target: &Node) -> Redirect {
        let path = if origin.path_and_query.starts_with('/') {
            origin.path_and_query.clone()
        } else {
            format!("/{}", origin.path_and_query)
        };

        Redirect {
            location: format!("{}{}", target.base_url(), path),
            node_id: target.id.clone(),
        }
    }
}
