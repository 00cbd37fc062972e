use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ErrorBody;

/// ApiError
///
/// Failure taxonomy of the HTTP API. Every variant renders as `{"error": "..."}` so a
/// client can rely on the presence of the `error` field alone.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Repository(RepositoryError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Category not found".to_string())
            }
            ApiError::Repository(RepositoryError::InvalidParent(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ApiError::Repository(e) => {
                tracing::error!("Repository error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            ApiError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to prepare upload".to_string(),
                )
            }
            ApiError::Template(e) => {
                tracing::error!("Template error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to render page".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// RepositoryError
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("category {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    InvalidParent(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// IdentityError
///
/// Failures talking to the identity provider. An expired or unknown token is not an
/// error: it resolves to "no current user".
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider answered {0}")]
    Status(u16),
}

/// StorageError
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("presigning failed: {0}")]
    Presign(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// DirectoryError
///
/// Failure kinds seen by the category directory client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The request never produced a response (connection refused, reset, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("malformed payload: {0}")]
    Decode(String),

    /// The server answered with an `error` field.
    #[error("server rejected request: {0}")]
    Server(String),

    /// The owning view was torn down before the request resolved.
    #[error("request outlived its view")]
    Cancelled,
}

impl From<reqwest::Error> for DirectoryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DirectoryError::Decode(e.to_string())
        } else {
            DirectoryError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(e: serde_json::Error) -> Self {
        DirectoryError::Decode(e.to_string())
    }
}
