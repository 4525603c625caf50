use std::sync::Arc;

use crate::auth::ApiKeyAuthenticator;
use crate::config::NodeConfig;
use crate::containers::directory::ClusterDirectory;
use crate::containers::registry::ContainerRegistry;
use crate::objects::memory::MemoryObjectStore;
use crate::objects::store::ObjectStore;
use crate::pipeline::write::WritePipeline;
use crate::replication::apply::ReplicaApplier;
use crate::replication::coordinator::{HttpReplicator, Replicator};
use crate::topology::service::ClusterTopology;

/// Everything a request handler needs, shared through an `Extension`.
pub struct AppState {
    pub topology: Arc<ClusterTopology>,
    pub registry: Arc<ContainerRegistry>,
    pub store: Arc<dyn ObjectStore>,
    pub replicator: Arc<dyn Replicator>,
    pub authenticator: ApiKeyAuthenticator,
    pub pipeline: Arc<WritePipeline>,
    pub applier: ReplicaApplier,
    pub max_transfer_size: u64,
}

impl AppState {
    /// Wires the node from its configuration: containers from `containers`,
    /// an empty in-memory object store, HTTP replication to the peers.
    pub fn from_config(config: &NodeConfig, topology: Arc<ClusterTopology>) -> Arc<Self> {
        let registry = Arc::new(ContainerRegistry::from_config(&config.containers));
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new());
        let replicator: Arc<dyn Replicator> = Arc::new(HttpReplicator::new(
            topology.clone(),
            config.replication.timeout(),
        ));

        Self::with_parts(
            topology,
            registry,
            store,
            replicator,
            ApiKeyAuthenticator::from_config(&config.users),
            config,
        )
    }

    pub fn with_parts(
        topology: Arc<ClusterTopology>,
        registry: Arc<ContainerRegistry>,
        store: Arc<dyn ObjectStore>,
        replicator: Arc<dyn Replicator>,
        authenticator: ApiKeyAuthenticator,
        config: &NodeConfig,
    ) -> Arc<Self> {
        let directory = Arc::new(ClusterDirectory::new(
            registry.clone(),
            topology.clone(),
            config.replication.timeout(),
        ));
        let pipeline = Arc::new(WritePipeline::new(
            directory,
            store.clone(),
            replicator.clone(),
            topology.local_id().clone(),
            config.server.max_transfer_size,
        ));
        let applier = ReplicaApplier::new(store.clone(), registry.clone());

        Arc::new(Self {
            topology,
            registry,
            store,
            replicator,
            authenticator,
            pipeline,
            applier,
            max_transfer_size: config.server.max_transfer_size,
        })
    }
}
