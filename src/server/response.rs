use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::errors::{ErrorCode, ErrorResponse};
use crate::pipeline::types::{WriteOutcome, WriteResponse};

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl IntoResponse for WriteResponse {
    fn into_response(self) -> Response {
        match self {
            WriteResponse::Ok => StatusCode::OK.into_response(),
            WriteResponse::Created => StatusCode::CREATED.into_response(),
            WriteResponse::Redirect(redirect) => (
                redirect.status(),
                [(header::LOCATION, redirect.location)],
            )
                .into_response(),
            WriteResponse::Error(error) => error.into_response(),
        }
    }
}

impl IntoResponse for WriteOutcome {
    fn into_response(self) -> Response {
        self.response.into_response()
    }
}

pub fn error(code: ErrorCode, message: Option<&str>) -> Response {
    ErrorResponse::new(code, message).into_response()
}
