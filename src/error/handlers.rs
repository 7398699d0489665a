//! Error handlers
//!
//! Maps storage errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};

use crate::error::types::StorageError;

/// Convert error to HTTP status code
pub fn error_to_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::AccessDenied(_) => StatusCode::FORBIDDEN,
        StorageError::ReadFailure(_, _) => StatusCode::NOT_FOUND,
        StorageError::InvalidPattern(_) => StatusCode::BAD_REQUEST,
        StorageError::WriteFailure(_, _) | StorageError::InvalidRoot(_, _) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let status = error_to_status(&self);
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => error!("{}", self),
            StatusCode::BAD_REQUEST => warn!("{}", self),
            _ => {}
        }
        // Bodies stay empty; the status carries the outcome.
        status.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn access_denied_is_forbidden() {
        let err = StorageError::AccessDenied("../etc/passwd".into());
        assert_eq!(error_to_status(&err), StatusCode::FORBIDDEN);
    }

    #[test]
    fn read_failure_is_not_found() {
        let err = StorageError::ReadFailure(
            "missing.js".into(),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
