use std::fmt;

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use serde::Serialize;

pub async fn handler404(path: Uri) -> (StatusCode, Json<Error>) {
    (
        StatusCode::NOT_FOUND,
        Json(Error::NotFound {
            message: format!("Invalid path: {}", path),
        }),
    )
}

/// Every failure a handler can report. Serialized as
/// `{"error": "<Kind>", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error")]
pub enum Error {
    MethodNotAllowed { message: String },
    MalformedInput { message: String },
    Validation { message: String },
    InvalidIdentifier { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Persistence { kind: &'static str, message: String },
}

impl Error {
    pub fn malformed<S: Into<String>>(msg: S) -> Error {
        Error::MalformedInput {
            message: msg.into(),
        }
    }

    pub fn validation<S: Into<String>>(msg: S) -> Error {
        Error::Validation {
            message: msg.into(),
        }
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Error {
        Error::NotFound {
            message: msg.into(),
        }
    }

    pub fn conflict<S: Into<String>>(msg: S) -> Error {
        Error::Conflict {
            message: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::MalformedInput { .. }
            | Error::Validation { .. }
            | Error::InvalidIdentifier { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::MethodNotAllowed { message }
            | Error::MalformedInput { message }
            | Error::Validation { message }
            | Error::InvalidIdentifier { message }
            | Error::NotFound { message }
            | Error::Conflict { message }
            | Error::Persistence { message, .. } => message,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Persistence { kind, message } => write!(f, "{}: {}", kind, message),
            other => f.write_str(other.message()),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{} -> {}", status, self);
        } else {
            log::warn!("{} -> {}", status, self);
        }
        (status, Json(self)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence {
            kind: "DatabaseError",
            message: err.to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Persistence {
            kind: "MigrationError",
            message: err.to_string(),
        }
    }
}

// Request bodies are decoded explicitly into `MalformedInput`; this covers
// stored documents that no longer match their shape.
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence {
            kind: "DecodeError",
            message: err.to_string(),
        }
    }
}
