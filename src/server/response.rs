//! HTTP framing for tiles and errors.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::error::Error;
use crate::service::TileResponse;

pub const MVT_CONTENT_TYPE: &str = "application/vnd.mapbox-vector-tile";

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::SchemaResolution { .. } => StatusCode::BAD_REQUEST,
            Error::Execution(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Execution(_) | Error::Config(_) | Error::InvalidConfig(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        let status = err.status_code();
        // Database details stay in the logs
        let error = if err.is_client_error() {
            err.to_string()
        } else {
            status
                .canonical_reason()
                .unwrap_or("Server error")
                .to_string()
        };

        Self {
            error,
            code: status.as_u16(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "tile request failed");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

impl IntoResponse for TileResponse {
    fn into_response(self) -> Response {
        match self {
            TileResponse::Empty => StatusCode::NO_CONTENT.into_response(),
            TileResponse::Payload(bytes) => {
                ([(header::CONTENT_TYPE, MVT_CONTENT_TYPE)], bytes).into_response()
            }
        }
    }
}
