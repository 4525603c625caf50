use async_trait::async_trait;

use super::locks::ObjectGuard;
use super::types::{ContainerStats, ObjectSlice, RangeWrite, StoreError};
use crate::containers::types::ContainerId;

/// Local operations on the objects of a container this node holds.
///
/// Implementations never talk to other nodes. Callers that need a
/// read-modify-restore sequence to be atomic with respect to other writers
/// hold the guard returned by [`ObjectStore::lock`] for the whole sequence.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Acquires the per-object locks for `keys` in `container`.
    async fn lock(&self, container: &ContainerId, keys: &[&str]) -> ObjectGuard;

    async fn exists(&self, container: &ContainerId, key: &str) -> Result<bool, StoreError>;

    /// Reads up to `length` bytes starting at `offset`, clipped to the end of
    /// the object. Fails with [`StoreError::OutOfRange`] when `offset` lies
    /// past the end.
    async fn read(
        &self,
        container: &ContainerId,
        key: &str,
        offset: u64,
        length: u64,
    ) -> Result<ObjectSlice, StoreError>;

    async fn write_range(
        &self,
        container: &ContainerId,
        key: &str,
        write: &RangeWrite,
    ) -> Result<(), StoreError>;

    /// Fails with `NotFound` if `key` is missing and `Conflict` if `new_key` exists.
    async fn rename(&self, container: &ContainerId, key: &str, new_key: &str)
    -> Result<(), StoreError>;

    /// Fails with `Conflict` if `key` already exists.
    async fn create(
        &self,
        container: &ContainerId,
        key: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<(), StoreError>;

    async fn delete(&self, container: &ContainerId, key: &str) -> Result<(), StoreError>;

    /// Removes every object of the container.
    async fn drop_container(&self, container: &ContainerId) -> Result<(), StoreError>;

    async fn stats(&self, container: &ContainerId) -> Result<ContainerStats, StoreError>;
}
