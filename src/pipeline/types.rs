use crate::auth::AuthContext;
use crate::containers::types::ContainerId;
use crate::errors::ErrorResponse;
use crate::redirect::{Redirect, RequestOrigin};

/// One client write, already parsed from the transport.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub container: ContainerId,
    pub key: String,
    pub auth: AuthContext,
    /// Rename target. Selects rename mode when present and non-empty.
    pub rename: Option<String>,
    /// Byte offset. Selects range-write mode when no rename target is given.
    pub offset: Option<u64>,
    pub data: Vec<u8>,
    /// Length declared by the client, checked against the transfer limit
    /// alongside the actual payload length.
    pub content_length: Option<u64>,
    /// Set when the transport stopped buffering the body at the transfer
    /// limit; `data` is then empty.
    pub oversized: bool,
    /// Only used when creating objects.
    pub content_type: Option<String>,
    pub origin: RequestOrigin,
}

impl WriteRequest {
    pub fn new(container: ContainerId, key: &str, auth: AuthContext) -> Self {
        let origin = RequestOrigin::new(format!("/{}/{}/{}", container.user, container.name, key));
        Self {
            container,
            key: key.to_string(),
            auth,
            rename: None,
            offset: None,
            data: Vec::new(),
            content_length: None,
            oversized: false,
            content_type: None,
            origin,
        }
    }

    pub fn rename_to(mut self, new_key: &str) -> Self {
        self.rename = Some(new_key.to_string());
        self
    }

    pub fn write_at(mut self, offset: u64, data: &[u8]) -> Self {
        self.offset = Some(offset);
        self.data = data.to_vec();
        self
    }

    pub fn with_origin(mut self, origin: RequestOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub(crate) fn rename_target(&self) -> Option<&str> {
        self.rename.as_deref().filter(|target| !target.is_empty())
    }
}

/// Where a request ended up in the write state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Start,
    Located,
    Authorized,
    LocallyMutated,
    Replicated,
    ReplicationFailed,
    RolledBack,
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteResponse {
    /// 200 with an empty body.
    Ok,
    /// 201 with an empty body.
    Created,
    Redirect(Redirect),
    Error(ErrorResponse),
}

/// Terminal state of a request plus the single response chosen for it.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub state: WriteState,
    pub response: WriteResponse,
}

impl WriteOutcome {
    pub fn rejected(error: ErrorResponse) -> Self {
        Self {
            state: WriteState::Rejected,
            response: WriteResponse::Error(error),
        }
    }

    pub fn redirect(redirect: Redirect) -> Self {
        Self {
            state: WriteState::Rejected,
            response: WriteResponse::Redirect(redirect),
        }
    }

    pub fn error(&self) -> Option<&ErrorResponse> {
        match &self.response {
            WriteResponse::Error(error) => Some(error),
            _ => None,
        }
    }
}
