use std::sync::Arc;
use tracing::{debug, error, warn};

use super::compensation::Compensation;
use super::types::{WriteOutcome, WriteRequest, WriteResponse, WriteState};
use crate::auth::AuthContext;
use crate::containers::directory::ContainerDirectory;
use crate::containers::locator::ContainerLocator;
use crate::containers::types::{AuditEntry, Container, Resolution};
use crate::errors::{ErrorCode, ErrorResponse};
use crate::objects::store::ObjectStore;
use crate::objects::types::{DEFAULT_CONTENT_TYPE, RangeWrite, StoreError};
use crate::redirect::RedirectBuilder;
use crate::replication::coordinator::Replicator;
use crate::replication::types::Operation;
use crate::topology::types::NodeId;

/// Drives client writes through locate, authorize, mutate, replicate and,
/// when replication fails, compensate.
pub struct WritePipeline {
    locator: ContainerLocator,
    directory: Arc<dyn ContainerDirectory>,
    store: Arc<dyn ObjectStore>,
    replicator: Arc<dyn Replicator>,
    max_transfer_size: u64,
}

impl WritePipeline {
    pub fn new(
        directory: Arc<dyn ContainerDirectory>,
        store: Arc<dyn ObjectStore>,
        replicator: Arc<dyn Replicator>,
        local_id: NodeId,
        max_transfer_size: u64,
    ) -> Self {
        Self {
            locator: ContainerLocator::new(directory.clone(), local_id),
            directory,
            store,
            replicator,
            max_transfer_size,
        }
    }

    /// Renames or range-writes an existing object.
    pub async fn execute(&self, req: WriteRequest) -> WriteOutcome {
        let container = match self.locate_and_authorize(&req).await {
            Ok(container) => container,
            Err(outcome) => return outcome,
        };

        let _guard = {
            let mut keys = vec![req.key.as_str()];
            if let Some(target) = req.rename_target() {
                keys.push(target);
            }
            self.store.lock(&container.id, &keys).await
        };

        match self.store.exists(&container.id, &req.key).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Object {}/{} does not exist", container.id, req.key);
                return WriteOutcome::rejected(ErrorResponse::new(
                    ErrorCode::NotFound,
                    Some("Object does not exist."),
                ));
            }
            Err(e) => {
                warn!("Existence check for {}/{} failed: {}", container.id, req.key, e);
                return WriteOutcome::rejected(ErrorResponse::from_code(e.code(), None));
            }
        }

        if let Some(new_key) = req.rename_target() {
            let new_key = new_key.to_string();
            self.rename(&container, &req, new_key).await
        } else if let Some(offset) = req.offset {
            self.write_range(&container, req, offset).await
        } else {
            warn!("Write to {}/{} names neither an offset nor a rename target", container.id, req.key);
            WriteOutcome::rejected(ErrorResponse::new(
                ErrorCode::BadRequest,
                Some("Query must specify an offset or a rename target."),
            ))
        }
    }

    /// Creates a new object. Same locate and authorization rules as `execute`.
    pub async fn create(&self, req: WriteRequest) -> WriteOutcome {
        let container = match self.locate_and_authorize(&req).await {
            Ok(container) => container,
            Err(outcome) => return outcome,
        };
        if let Some(outcome) = self.check_transfer_size(&container, &req) {
            return outcome;
        }

        let _guard = self.store.lock(&container.id, &[req.key.as_str()]).await;
        let content_type = req
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        if let Err(e) = self
            .store
            .create(&container.id, &req.key, &content_type, &req.data)
            .await
        {
            warn!("Unable to create object {}/{}: {}", container.id, req.key, e);
            return rejected_by_store(e, "Unable to create object.");
        }

        let mut compensation = self.compensation(&container);
        compensation.arm(Operation::DeleteObject {
            key: req.key.clone(),
        });
        trace_state(&container, &req.key, WriteState::LocallyMutated);

        let size = req.data.len();
        let operation = Operation::Create {
            key: req.key.clone(),
            content_type,
            data: req.data,
        };
        self.finish(
            &container,
            &req.key,
            &req.auth,
            operation,
            compensation,
            WriteResponse::Created,
            Some(format!("{} bytes", size)),
        )
        .await
    }

    /// `execute` on a task of its own. Once started, the write runs on to
    /// `Replicated` or `RolledBack` even if the caller stops waiting.
    pub async fn execute_detached(self: Arc<Self>, req: WriteRequest) -> WriteOutcome {
        let target = format!("{}/{}", req.container, req.key);
        join_write(&target, tokio::spawn(async move { self.execute(req).await })).await
    }

    /// `create` on a task of its own, with the same guarantee as
    /// `execute_detached`.
    pub async fn create_detached(self: Arc<Self>, req: WriteRequest) -> WriteOutcome {
        let target = format!("{}/{}", req.container, req.key);
        join_write(&target, tokio::spawn(async move { self.create(req).await })).await
    }

    async fn locate_and_authorize(&self, req: &WriteRequest) -> Result<Container, WriteOutcome> {
        let container = match self.locator.resolve(&req.container).await {
            Resolution::Local(container) => container,
            Resolution::Remote(owners) => {
                // resolve never returns an empty owner list
                let Some(target) = owners.first() else {
                    return Err(container_not_found(req));
                };
                let redirect = RedirectBuilder::build(&req.origin, target);
                debug!(
                    "Redirecting {}/{} to {}",
                    req.container, req.key, redirect.location
                );
                return Err(WriteOutcome::redirect(redirect));
            }
            Resolution::NotFound => return Err(container_not_found(req)),
        };
        trace_state(&container, &req.key, WriteState::Located);

        if let Err(code) = authorize_write(&container, &req.auth) {
            warn!(
                "Unauthorized write to {}/{} by {}",
                container.id,
                req.key,
                req.auth.user.as_deref().unwrap_or("anonymous")
            );
            return Err(WriteOutcome::rejected(ErrorResponse::new(
                code,
                Some("Unauthorized."),
            )));
        }
        trace_state(&container, &req.key, WriteState::Authorized);

        Ok(container)
    }

    async fn rename(&self, container: &Container, req: &WriteRequest, new_key: String) -> WriteOutcome {
        if let Err(e) = self.store.rename(&container.id, &req.key, &new_key).await {
            warn!(
                "Unable to rename {}/{} to {}: {}",
                container.id, req.key, new_key, e
            );
            return rejected_by_store(e, "Unable to rename object.");
        }

        let mut compensation = self.compensation(container);
        compensation.arm(Operation::Rename {
            key: new_key.clone(),
            new_key: req.key.clone(),
        });
        trace_state(container, &req.key, WriteState::LocallyMutated);

        let detail = Some(format!("to {}", new_key));
        let operation = Operation::Rename {
            key: req.key.clone(),
            new_key,
        };
        self.finish(
            container,
            &req.key,
            &req.auth,
            operation,
            compensation,
            WriteResponse::Ok,
            detail,
        )
        .await
    }

    async fn write_range(&self, container: &Container, req: WriteRequest, offset: u64) -> WriteOutcome {
        if let Some(outcome) = self.check_transfer_size(container, &req) {
            return outcome;
        }

        let restore = match self.capture_pre_image(container, &req.key, offset, req.data.len()).await {
            Ok(restore) => restore,
            Err(e) => {
                warn!(
                    "Unable to retrieve original data from {}/{}: {}",
                    container.id, req.key, e
                );
                return WriteOutcome::rejected(ErrorResponse::new(
                    ErrorCode::StorageFailure,
                    Some("Unable to retrieve original data."),
                ));
            }
        };

        let write = RangeWrite::new(offset, req.data);
        if let Err(e) = self.store.write_range(&container.id, &req.key, &write).await {
            warn!("Unable to write range to {}/{}: {}", container.id, req.key, e);
            return rejected_by_store(e, "Unable to write range to object.");
        }

        let mut compensation = self.compensation(container);
        compensation.arm(Operation::WriteRange {
            key: req.key.clone(),
            write: restore,
        });
        trace_state(container, &req.key, WriteState::LocallyMutated);

        let detail = Some(format!("{} bytes at {}", write.data.len(), offset));
        let operation = Operation::WriteRange {
            key: req.key.clone(),
            write,
        };
        self.finish(
            container,
            &req.key,
            &req.auth,
            operation,
            compensation,
            WriteResponse::Ok,
            detail,
        )
        .await
    }

    /// Builds the write that puts `[offset, offset + len)` back the way it is now.
    ///
    /// Bytes past the current end are recorded as zeros and the restoring write
    /// truncates to the current length, so anything the forward write appends
    /// (including a zero-filled gap) is removed again.
    async fn capture_pre_image(
        &self,
        container: &Container,
        key: &str,
        offset: u64,
        len: usize,
    ) -> Result<RangeWrite, StoreError> {
        let (mut data, object_len) = match self.store.read(&container.id, key, offset, len as u64).await {
            Ok(slice) => (slice.data, slice.object_len),
            Err(StoreError::OutOfRange { object_len, .. }) => {
                debug!("Write to {}/{} starts past the end, pre-image is zeros", container.id, key);
                (Vec::new(), object_len)
            }
            Err(e) => return Err(e),
        };
        data.resize(len, 0);

        Ok(RangeWrite {
            offset,
            data,
            truncate_to: Some(object_len),
        })
    }

    fn check_transfer_size(&self, container: &Container, req: &WriteRequest) -> Option<WriteOutcome> {
        let too_large = req.oversized
            || req.data.len() as u64 > self.max_transfer_size
            || req
                .content_length
                .is_some_and(|len| len > self.max_transfer_size);

        if too_large {
            warn!(
                "Transfer to {}/{} too large ({} bytes, limit {})",
                container.id,
                req.key,
                req.content_length.unwrap_or(req.data.len() as u64),
                self.max_transfer_size
            );
            return Some(WriteOutcome::rejected(ErrorResponse::new(
                ErrorCode::PayloadTooLarge,
                None,
            )));
        }
        None
    }

    fn compensation<'a>(&'a self, container: &'a Container) -> Compensation<'a> {
        Compensation::new(self.store.as_ref(), self.replicator.as_ref(), container)
    }

    /// Replicates an operation that already landed locally and settles its
    /// compensation before choosing the response.
    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        container: &Container,
        key: &str,
        auth: &AuthContext,
        operation: Operation,
        mut compensation: Compensation<'_>,
        success: WriteResponse,
        detail: Option<String>,
    ) -> WriteOutcome {
        match self.replicator.replicate(container, &operation).await {
            Ok(()) => {
                compensation.disarm();
                trace_state(container, key, WriteState::Replicated);
                self.directory.record_audit(
                    &container.id,
                    AuditEntry::now(auth.user.as_deref(), operation.name(), key, detail),
                );
                WriteOutcome {
                    state: WriteState::Replicated,
                    response: success,
                }
            }
            Err(e) => {
                warn!(
                    "Unable to replicate {} on {}/{}: {}",
                    operation.name(),
                    container.id,
                    key,
                    e
                );
                trace_state(container, key, WriteState::ReplicationFailed);
                let _ = compensation.run().await;
                trace_state(container, key, WriteState::RolledBack);

                WriteOutcome {
                    state: WriteState::RolledBack,
                    response: WriteResponse::Error(ErrorResponse::new(e.code(), None)),
                }
            }
        }
    }
}

/// Public-write containers accept anyone; otherwise the requester must be the
/// container's user. An explicit permission set must allow object writes.
pub fn authorize_write(container: &Container, auth: &AuthContext) -> Result<(), ErrorCode> {
    if !container.is_public_write() {
        auth.require_user(&container.id.user)?;
    }
    if !auth.can_write_objects() {
        return Err(ErrorCode::Unauthorized);
    }
    Ok(())
}

async fn join_write(
    target: &str,
    handle: tokio::task::JoinHandle<WriteOutcome>,
) -> WriteOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Write task for {} failed: {}", target, e);
            WriteOutcome::rejected(ErrorResponse::from_code(ErrorCode::StorageFailure, None))
        }
    }
}

fn container_not_found(req: &WriteRequest) -> WriteOutcome {
    warn!("Unable to find container {}", req.container);
    WriteOutcome::rejected(ErrorResponse::new(
        ErrorCode::NotFound,
        Some("Unknown user or container."),
    ))
}

fn rejected_by_store(error: StoreError, message: &str) -> WriteOutcome {
    WriteOutcome::rejected(ErrorResponse::from_code(error.code(), Some(message)))
}

fn trace_state(container: &Container, key: &str, state: WriteState) {
    debug!("{}/{} -> {:?}", container.id, key, state);
}
