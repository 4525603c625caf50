//! Request authentication.
//!
//! Callers present an API key in the `x-api-key` header. The key resolves to a
//! user id and, optionally, a permission set; a key without a permission set is
//! unrestricted. Unknown or missing keys yield an anonymous context, and it is
//! up to each operation to decide whether anonymous access is acceptable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::UserConfig;
use crate::errors::ErrorCode;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Permissions {
    pub write_object: bool,
    pub delete_container: bool,
}

/// Identity and permissions attached to one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub user: Option<String>,
    pub permissions: Option<Permissions>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            permissions: None,
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// User ids are compared case-insensitively.
    pub fn is_user(&self, user: &str) -> bool {
        self.user
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(user))
    }

    pub fn can_write_objects(&self) -> bool {
        self.permissions.is_none_or(|p| p.write_object)
    }

    pub fn can_delete_containers(&self) -> bool {
        self.permissions.is_none_or(|p| p.delete_container)
    }

    /// The requester must be authenticated as `user`.
    pub fn require_user(&self, user: &str) -> Result<(), ErrorCode> {
        if !self.is_authenticated() {
            return Err(ErrorCode::Unauthenticated);
        }
        if !self.is_user(user) {
            return Err(ErrorCode::Unauthorized);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiKeyAuthenticator {
    keys: HashMap<String, AuthContext>,
}

impl ApiKeyAuthenticator {
    pub fn from_config(users: &[UserConfig]) -> Self {
        let keys = users
            .iter()
            .map(|entry| {
                let context = AuthContext {
                    user: Some(entry.user.clone()),
                    permissions: entry.permissions,
                };
                (entry.api_key.clone(), context)
            })
            .collect();

        Self { keys }
    }

    pub fn authenticate(&self, api_key: Option<&str>) -> AuthContext {
        match api_key.and_then(|key| self.keys.get(key)) {
            Some(context) => context.clone(),
            None => {
                if api_key.is_some() {
                    tracing::debug!("Unknown API key presented, treating request as anonymous");
                }
                AuthContext::anonymous()
            }
        }
    }
}
