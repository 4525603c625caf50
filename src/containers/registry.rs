use dashmap::DashMap;
use std::collections::BTreeMap;

use super::types::{AuditEntry, Container, ContainerId};
use crate::config::ContainerConfig;

const MAX_AUDIT_ENTRIES: usize = 10_000;

/// Everything this node keeps about a container it holds.
#[derive(Debug, Clone)]
pub struct ContainerRecord {
    pub container: Container,
    pub audit_log: Vec<AuditEntry>,
    pub key_values: BTreeMap<String, String>,
}

impl ContainerRecord {
    fn new(container: Container) -> Self {
        Self {
            container,
            audit_log: Vec::new(),
            key_values: BTreeMap::new(),
        }
    }
}

/// Containers held locally, keyed by `(user, name)`.
#[derive(Default)]
pub struct ContainerRegistry {
    containers: DashMap<ContainerId, ContainerRecord>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self {
            containers: DashMap::new(),
        }
    }

    pub fn from_config(configs: &[ContainerConfig]) -> Self {
        let registry = Self::new();
        for config in configs {
            let mut record = ContainerRecord::new(Container::from(config));
            record.key_values = config.key_values.clone();
            registry
                .containers
                .insert(record.container.id.clone(), record);
        }
        registry
    }

    pub fn insert(&self, container: Container) {
        self.containers
            .insert(container.id.clone(), ContainerRecord::new(container));
    }

    pub fn get(&self, id: &ContainerId) -> Option<Container> {
        self.containers
            .get(id)
            .map(|record| record.container.clone())
    }

    pub fn contains(&self, id: &ContainerId) -> bool {
        self.containers.contains_key(id)
    }

    pub fn remove(&self, id: &ContainerId) -> Option<Container> {
        self.containers.remove(id).map(|(_, record)| record.container)
    }

    /// Containers of `user`, ordered by name.
    pub fn list_for_user(&self, user: &str) -> Vec<Container> {
        let user = user.to_ascii_lowercase();
        let mut containers: Vec<Container> = self
            .containers
            .iter()
            .filter(|entry| entry.key().user == user)
            .map(|entry| entry.value().container.clone())
            .collect();
        containers.sort_by(|a, b| a.id.name.cmp(&b.id.name));
        containers
    }

    pub fn append_audit(&self, id: &ContainerId, entry: AuditEntry) -> bool {
        match self.containers.get_mut(id) {
            Some(mut record) => {
                if record.audit_log.len() >= MAX_AUDIT_ENTRIES {
                    record.audit_log.remove(0);
                }
                record.audit_log.push(entry);
                true
            }
            None => false,
        }
    }

    pub fn audit_log(&self, id: &ContainerId) -> Vec<AuditEntry> {
        self.containers
            .get(id)
            .map(|record| record.audit_log.clone())
            .unwrap_or_default()
    }

    pub fn clear_audit_log(&self, id: &ContainerId) -> bool {
        match self.containers.get_mut(id) {
            Some(mut record) => {
                record.audit_log.clear();
                true
            }
            None => false,
        }
    }

    pub fn key_values(&self, id: &ContainerId) -> BTreeMap<String, String> {
        self.containers
            .get(id)
            .map(|record| record.key_values.clone())
            .unwrap_or_default()
    }

    pub fn set_key_values(&self, id: &ContainerId, key_values: BTreeMap<String, String>) -> bool {
        match self.containers.get_mut(id) {
            Some(mut record) => {
                record.key_values = key_values;
                true
            }
            None => false,
        }
    }

    pub fn clear_key_values(&self, id: &ContainerId) -> bool {
        self.set_key_values(id, BTreeMap::new())
    }
}
