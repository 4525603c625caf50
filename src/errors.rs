//! Error Taxonomy & Status Mapper
//!
//! Every failure the node reports to a client is reduced to an [`ErrorCode`].
//! The code owns a fixed `(HTTP status, error id)` pair; clients depend on the
//! ids, so the table below must stay stable across versions.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Closed set of internal failure reasons.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Unauthenticated,
    Unauthorized,
    NotFound,
    Conflict,
    OutOfRange,
    PayloadTooLarge,
    BadRequest,
    StorageFailure,
    ReplicationFailure,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 9] = [
        ErrorCode::Unauthenticated,
        ErrorCode::Unauthorized,
        ErrorCode::NotFound,
        ErrorCode::Conflict,
        ErrorCode::OutOfRange,
        ErrorCode::PayloadTooLarge,
        ErrorCode::BadRequest,
        ErrorCode::StorageFailure,
        ErrorCode::ReplicationFailure,
    ];

    /// Returns the `(HTTP status, application error id)` pair for this code.
    pub fn status(self) -> (StatusCode, u32) {
        match self {
            ErrorCode::Unauthenticated => (StatusCode::UNAUTHORIZED, 1),
            ErrorCode::BadRequest => (StatusCode::BAD_REQUEST, 2),
            ErrorCode::Unauthorized => (StatusCode::UNAUTHORIZED, 3),
            ErrorCode::StorageFailure => (StatusCode::INTERNAL_SERVER_ERROR, 4),
            ErrorCode::NotFound => (StatusCode::NOT_FOUND, 5),
            ErrorCode::Conflict => (StatusCode::CONFLICT, 6),
            ErrorCode::OutOfRange => (StatusCode::RANGE_NOT_SATISFIABLE, 7),
            ErrorCode::ReplicationFailure => (StatusCode::INTERNAL_SERVER_ERROR, 10),
            ErrorCode::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, 11),
        }
    }
}

/// JSON error envelope sent with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_id: u32,
    pub http_status: u16,
    pub message: Option<String>,
    pub internal_code: Option<ErrorCode>,
}

impl ErrorResponse {
    /// Envelope for a rejection decided by the handler itself.
    pub fn new(code: ErrorCode, message: Option<&str>) -> Self {
        let (status, error_id) = code.status();
        Self {
            error_id,
            http_status: status.as_u16(),
            message: message.map(str::to_string),
            internal_code: None,
        }
    }

    /// Envelope for a failure reported by a collaborator; the code is echoed
    /// back as `internalCode`.
    pub fn from_code(code: ErrorCode, message: Option<&str>) -> Self {
        Self {
            internal_code: Some(code),
            ..Self::new(code, message)
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
