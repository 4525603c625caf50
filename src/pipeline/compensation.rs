use tracing::{error, info, warn};

use crate::containers::types::Container;
use crate::objects::store::ObjectStore;
use crate::objects::types::StoreError;
use crate::replication::apply::apply_to_store;
use crate::replication::coordinator::Replicator;
use crate::replication::types::{Operation, ReplicationError};

/// What a compensation run did. Neither result is surfaced to the client.
#[derive(Debug)]
pub struct CompensationReport {
    pub local: Result<(), StoreError>,
    pub broadcast: Result<(), ReplicationError>,
}

/// Rollback guard for one locally applied mutation.
///
/// Armed with the inverse operation once the mutation has landed locally.
/// `disarm` on success, `run` on replication failure. Running applies the
/// inverse to the local store and then broadcasts it once; the broadcast
/// goes out even when the local undo failed.
#[must_use = "an armed compensation must be run or disarmed"]
pub struct Compensation<'a> {
    store: &'a dyn ObjectStore,
    replicator: &'a dyn Replicator,
    container: &'a Container,
    inverse: Option<Operation>,
}

impl<'a> Compensation<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        replicator: &'a dyn Replicator,
        container: &'a Container,
    ) -> Self {
        Self {
            store,
            replicator,
            container,
            inverse: None,
        }
    }

    pub fn arm(&mut self, inverse: Operation) {
        self.inverse = Some(inverse);
    }

    pub fn disarm(&mut self) {
        self.inverse = None;
    }

    pub fn is_armed(&self) -> bool {
        self.inverse.is_some()
    }

    /// Runs the inverse operation if armed. Returns `None` when disarmed.
    pub async fn run(mut self) -> Option<CompensationReport> {
        let inverse = self.inverse.take()?;
        let id = &self.container.id;

        let local = apply_to_store(self.store, id, &inverse).await;
        match &local {
            Ok(()) => info!("Rolled back {} on {} locally", inverse.name(), id),
            Err(e) => error!("Local rollback of {} on {} failed: {}", inverse.name(), id, e),
        }

        let broadcast = self.replicator.replicate(self.container, &inverse).await;
        if let Err(e) = &broadcast {
            // peers left diverged here are not reconciled later
            warn!("Rollback broadcast of {} on {} incomplete: {}", inverse.name(), id, e);
        }

        Some(CompensationReport { local, broadcast })
    }
}

impl Drop for Compensation<'_> {
    fn drop(&mut self) {
        if let Some(inverse) = &self.inverse {
            error!(
                "Compensation for {} on {} dropped without running",
                inverse.name(),
                self.container.id
            );
        }
    }
}
