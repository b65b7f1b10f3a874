use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::hosting::HostingError;

/// Why token resolution failed. Distinguished so the HTTP layer can tell the
/// client to start a reconnect flow rather than show a generic error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenFailure {
    /// No git integration row exists for this user/platform.
    NoIntegration,
    /// The stored token failed validation against the provider. The stored
    /// token has already been cleared as a side effect.
    Invalid(String),
}

impl std::fmt::Display for TokenFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenFailure::NoIntegration => write!(f, "no git integration connected"),
            TokenFailure::Invalid(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Duplicate {0}")]
    DuplicateName(&'static str),

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Git access token error: {0}")]
    Token(TokenFailure),

    #[error(transparent)]
    Hosting(#[from] HostingError),

    #[error("Failed to create repository '{repo_name}': {reason}")]
    RepositoryCreation { repo_name: String, reason: String },

    #[error("Repository '{repo_name}' created but pages deployment failed: {reason}")]
    PagesDeployment { repo_name: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::NotFound(_, _) => (StatusCode::NOT_FOUND, self.to_string()),
            ServiceError::AccessDenied => (StatusCode::FORBIDDEN, self.to_string()),
            ServiceError::DuplicateName(_) => (StatusCode::CONFLICT, self.to_string()),
            ServiceError::Validation { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            ServiceError::Token(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServiceError::Hosting(e) => {
                // Preserve the upstream status where it maps cleanly, so the
                // client can tell a rate limit from a hard failure.
                let status =
                    StatusCode::from_u16(e.status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, self.to_string())
            }
            ServiceError::RepositoryCreation { .. } => (StatusCode::BAD_GATEWAY, self.to_string()),
            ServiceError::PagesDeployment { .. } => (StatusCode::BAD_GATEWAY, self.to_string()),
            ServiceError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Translate a sea-orm error into `DuplicateName` when it is a unique
/// constraint violation, otherwise pass it through as a database error.
///
/// Duplicates are caught post-hoc via the constraint rather than by a
/// check-then-insert, which would race.
pub fn map_unique_violation(err: sea_orm::DbErr, what: &'static str) -> ServiceError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => ServiceError::DuplicateName(what),
        _ => ServiceError::Database(err),
    }
}
