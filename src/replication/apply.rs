use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use super::protocol::ReplicateRequest;
use super::types::Operation;
use crate::containers::registry::ContainerRegistry;
use crate::containers::types::{AuditEntry, ContainerId, now_ms};
use crate::errors::ErrorCode;
use crate::objects::store::ObjectStore;
use crate::objects::types::StoreError;

const MAX_PROCESSED_OPS: usize = 10_000;

#[derive(Debug, Error, PartialEq)]
pub enum ApplyError {
    #[error("container {0} is not held by this node")]
    UnknownContainer(ContainerId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApplyError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApplyError::UnknownContainer(_) => ErrorCode::NotFound,
            ApplyError::Store(e) => e.code(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The `op_id` was seen before; nothing was changed.
    Duplicate,
}

/// Applies operations received from peers to the local replica.
///
/// Replicated operations are never forwarded again.
pub struct ReplicaApplier {
    store: Arc<dyn ObjectStore>,
    registry: Arc<ContainerRegistry>,
    processed_ops: DashMap<String, u64>,
}

impl ReplicaApplier {
    pub fn new(store: Arc<dyn ObjectStore>, registry: Arc<ContainerRegistry>) -> Self {
        Self {
            store,
            registry,
            processed_ops: DashMap::new(),
        }
    }

    fn should_process(&self, op_id: &str) -> bool {
        if self.processed_ops.contains_key(op_id) {
            return false;
        }
        if self.processed_ops.len() > MAX_PROCESSED_OPS {
            self.processed_ops.clear();
        }
        self.processed_ops.insert(op_id.to_string(), now_ms());
        true
    }

    pub async fn apply(&self, request: &ReplicateRequest) -> Result<ApplyOutcome, ApplyError> {
        if !self.should_process(&request.op_id) {
            tracing::debug!("Skipping duplicate operation {}", request.op_id);
            return Ok(ApplyOutcome::Duplicate);
        }

        let result = self.apply_operation(&request.container_id(), &request.operation).await;
        if result.is_err() {
            // a failed operation may be sent again under the same id
            self.processed_ops.remove(&request.op_id);
        }
        result.map(|_| ApplyOutcome::Applied)
    }

    async fn apply_operation(&self, id: &ContainerId, operation: &Operation) -> Result<(), ApplyError> {
        if !self.registry.contains(id) {
            if *operation == Operation::DeleteContainer {
                return Ok(());
            }
            return Err(ApplyError::UnknownContainer(id.clone()));
        }

        let _guard = self.store.lock(id, &operation.keys()).await;
        apply_to_store(self.store.as_ref(), id, operation).await?;

        if *operation == Operation::DeleteContainer {
            self.registry.remove(id);
            tracing::info!("Container {} deleted by peer", id);
            return Ok(());
        }

        let key = operation.keys().first().map(|k| k.to_string()).unwrap_or_default();
        self.registry.append_audit(
            id,
            AuditEntry::now(None, operation.name(), &key, Some("replicated".to_string())),
        );
        Ok(())
    }
}

/// Applies `operation` to the local store only. Callers hold the object locks.
pub async fn apply_to_store(
    store: &dyn ObjectStore,
    id: &ContainerId,
    operation: &Operation,
) -> Result<(), StoreError> {
    match operation {
        Operation::Create {
            key,
            content_type,
            data,
        } => store.create(id, key, content_type, data).await,
        Operation::Rename { key, new_key } => store.rename(id, key, new_key).await,
        Operation::WriteRange { key, write } => store.write_range(id, key, write).await,
        Operation::DeleteObject { key } => store.delete(id, key).await,
        Operation::DeleteContainer => store.drop_container(id).await,
    }
}
