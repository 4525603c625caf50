use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::ErrorCode;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Bytes returned by a bounded read, plus the object's length at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSlice {
    pub data: Vec<u8>,
    pub content_type: String,
    pub object_len: u64,
}

/// A write of `data` at `offset`.
///
/// Any gap between the current end of the object and `offset` is filled with
/// zero bytes. When `truncate_to` is set the object is resized to exactly that
/// length after the bytes are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeWrite {
    pub offset: u64,
    pub data: Vec<u8>,
    pub truncate_to: Option<u64>,
}

impl RangeWrite {
    pub fn new(offset: u64, data: Vec<u8>) -> Self {
        Self {
            offset,
            data,
            truncate_to: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerStats {
    pub object_count: usize,
    pub total_bytes: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("object not found: {key}")]
    NotFound { key: String },
    #[error("object already exists: {key}")]
    Conflict { key: String },
    #[error("offset {offset} is beyond the end of {key} (length {object_len})")]
    OutOfRange {
        key: String,
        offset: u64,
        object_len: u64,
    },
    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::NotFound { .. } => ErrorCode::NotFound,
            StoreError::Conflict { .. } => ErrorCode::Conflict,
            StoreError::OutOfRange { .. } => ErrorCode::OutOfRange,
            StoreError::Storage(_) => ErrorCode::StorageFailure,
        }
    }
}
