//! Typed failure taxonomy shared by the store and the HTTP surface.
//!
//! Store operations return these kinds directly; the routes convert them to
//! responses through the [`IntoResponse`] impl below, so handlers can use
//! `?` end to end. The mapping to status codes lives here and nowhere else.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

// ---

/// Failure kinds surfaced by the service core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input: bad device address, out-of-range temperature,
    /// empty or oversized block name.
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation (duplicate device address).
    #[error("{0}")]
    Conflict(String),

    /// Referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Underlying store unreachable or transaction aborted.
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl Error {
    // ---
    fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Conflict(_) => "conflict",
            Error::NotFound(_) => "not_found",
            Error::Storage(_) => "storage",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Conflict(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // ---
        // Storage details stay in the logs; clients get a generic reason.
        let message = match &self {
            Error::Storage(e) => {
                tracing::error!("storage failure: {e}");
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": self.kind(),
            "message": message,
        }));

        (self.status_code(), body).into_response()
    }
}
