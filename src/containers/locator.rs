use std::sync::Arc;

use super::directory::ContainerDirectory;
use super::types::{ContainerId, Resolution};
use crate::topology::types::NodeId;

/// Decides whether a container is served here, elsewhere, or nowhere.
pub struct ContainerLocator {
    directory: Arc<dyn ContainerDirectory>,
    local_id: NodeId,
}

impl ContainerLocator {
    pub fn new(directory: Arc<dyn ContainerDirectory>, local_id: NodeId) -> Self {
        Self {
            directory,
            local_id,
        }
    }

    /// Local containers win. Otherwise remote owners are returned ordered by
    /// node id with the local node and duplicates removed; an empty owner set
    /// is `NotFound`.
    pub async fn resolve(&self, id: &ContainerId) -> Resolution {
        if let Some(container) = self.directory.get_container(id) {
            return Resolution::Local(container);
        }

        let mut owners: Vec<_> = self
            .directory
            .find_owners(id)
            .await
            .into_iter()
            .filter(|node| node.id != self.local_id)
            .collect();
        owners.sort_by(|a, b| a.id.cmp(&b.id));
        owners.dedup_by(|a, b| a.id == b.id);

        if owners.is_empty() {
            Resolution::NotFound
        } else {
            Resolution::Remote(owners)
        }
    }
}
