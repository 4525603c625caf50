//! Container lookup protocol.
//!
//! A node answers `GET /_cluster/containers/{user}/{container}` with `200` when it
//! holds the container and `404` otherwise. Nothing else is exchanged; the caller
//! already knows the node's address from the topology.

use anyhow::{Result, anyhow};

use super::types::ContainerId;
use crate::topology::types::Node;

/// Prefix of the internal owner lookup endpoint.
pub const ENDPOINT_CONTAINERS_INTERNAL: &str = "/_cluster/containers";

/// Builds the lookup URL for `id` on `node`, percent-encoding user and name.
pub fn owner_probe_url(node: &Node, id: &ContainerId) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(&node.base_url())?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("node address {} cannot carry a path", node.http_addr))?
        .pop_if_empty()
        .extend(
            ENDPOINT_CONTAINERS_INTERNAL
                .trim_start_matches('/')
                .split('/')
                .chain([id.user.as_str(), id.name.as_str()]),
        );
    Ok(url)
}
