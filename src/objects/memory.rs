use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::locks::{ObjectGuard, ObjectLocks};
use super::store::ObjectStore;
use super::types::{ContainerStats, ObjectSlice, RangeWrite, StoreError, StoredObject};
use crate::containers::types::ContainerId;

/// Objects may not grow past 1 GiB.
pub const DEFAULT_MAX_OBJECT_LEN: u64 = 1024 * 1024 * 1024;

/// In-memory object store.
///
/// Layout: `Container -> Key -> StoredObject`, both levels in `DashMap` for
/// concurrent access from request tasks.
pub struct MemoryObjectStore {
    containers: Arc<DashMap<ContainerId, DashMap<String, StoredObject>>>,
    locks: ObjectLocks,
    max_object_len: u64,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_max_object_len(DEFAULT_MAX_OBJECT_LEN)
    }

    pub fn with_max_object_len(max_object_len: u64) -> Self {
        Self {
            containers: Arc::new(DashMap::new()),
            locks: ObjectLocks::new(),
            max_object_len,
        }
    }

    /// Full copy of an object, if present.
    pub fn get_local(&self, container: &ContainerId, key: &str) -> Option<StoredObject> {
        self.containers
            .get(container)
            .and_then(|objects| objects.get(key).map(|object| object.value().clone()))
    }

    pub fn keys(&self, container: &ContainerId) -> Vec<String> {
        let mut keys: Vec<String> = self
            .containers
            .get(container)
            .map(|objects| objects.iter().map(|entry| entry.key().clone()).collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn checked_end(&self, key: &str, write: &RangeWrite) -> Result<usize, StoreError> {
        let end = write
            .offset
            .checked_add(write.data.len() as u64)
            .ok_or_else(|| StoreError::Storage(format!("range overflow writing {}", key)))?;
        let final_len = write.truncate_to.unwrap_or(end);

        if end > self.max_object_len || final_len > self.max_object_len {
            return Err(StoreError::Storage(format!(
                "write to {} would exceed the maximum object length of {} bytes",
                key, self.max_object_len
            )));
        }

        usize::try_from(end)
            .map_err(|_| StoreError::Storage(format!("range too large writing {}", key)))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn lock(&self, container: &ContainerId, keys: &[&str]) -> ObjectGuard {
        self.locks.lock(container, keys).await
    }

    async fn exists(&self, container: &ContainerId, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .containers
            .get(container)
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false))
    }

    async fn read(
        &self,
        container: &ContainerId,
        key: &str,
        offset: u64,
        length: u64,
    ) -> Result<ObjectSlice, StoreError> {
        let objects = self
            .containers
            .get(container)
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })?;
        let object = objects.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;

        let object_len = object.data.len() as u64;
        if offset > object_len {
            return Err(StoreError::OutOfRange {
                key: key.to_string(),
                offset,
                object_len,
            });
        }

        let end = offset.saturating_add(length).min(object_len);
        let data = object.data[offset as usize..end as usize].to_vec();

        Ok(ObjectSlice {
            data,
            content_type: object.content_type.clone(),
            object_len,
        })
    }

    async fn write_range(
        &self,
        container: &ContainerId,
        key: &str,
        write: &RangeWrite,
    ) -> Result<(), StoreError> {
        let end = self.checked_end(key, write)?;
        let offset = end - write.data.len();

        let objects = self
            .containers
            .get(container)
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })?;
        let mut object = objects.get_mut(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;

        if object.data.len() < end {
            object.data.resize(end, 0);
        }
        object.data[offset..end].copy_from_slice(&write.data);

        if let Some(len) = write.truncate_to {
            // checked_end bounded len by max_object_len
            object.data.resize(len as usize, 0);
        }

        Ok(())
    }

    async fn rename(
        &self,
        container: &ContainerId,
        key: &str,
        new_key: &str,
    ) -> Result<(), StoreError> {
        let objects = self
            .containers
            .get(container)
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })?;

        if !objects.contains_key(key) {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }
        if objects.contains_key(new_key) {
            return Err(StoreError::Conflict {
                key: new_key.to_string(),
            });
        }

        let (_, object) = objects.remove(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        objects.insert(new_key.to_string(), object);

        Ok(())
    }

    async fn create(
        &self,
        container: &ContainerId,
        key: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<(), StoreError> {
        if data.len() as u64 > self.max_object_len {
            return Err(StoreError::Storage(format!(
                "object {} exceeds the maximum object length of {} bytes",
                key, self.max_object_len
            )));
        }

        let objects = self.containers.entry(container.clone()).or_default();
        if objects.contains_key(key) {
            return Err(StoreError::Conflict {
                key: key.to_string(),
            });
        }

        objects.insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                data: data.to_vec(),
            },
        );
        Ok(())
    }

    async fn delete(&self, container: &ContainerId, key: &str) -> Result<(), StoreError> {
        self.containers
            .get(container)
            .and_then(|objects| objects.remove(key))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    async fn drop_container(&self, container: &ContainerId) -> Result<(), StoreError> {
        self.containers.remove(container);
        Ok(())
    }

    async fn stats(&self, container: &ContainerId) -> Result<ContainerStats, StoreError> {
        let stats = self
            .containers
            .get(container)
            .map(|objects| ContainerStats {
                object_count: objects.len(),
                total_bytes: objects
                    .iter()
                    .map(|entry| entry.value().data.len() as u64)
                    .sum(),
            })
            .unwrap_or_default();
        Ok(stats)
    }
}
