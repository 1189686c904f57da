use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{resource::Resource, validation::ValidationError};

/// Postgres SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for a foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// RepoError
///
/// Failure taxonomy of the persistence layer. Handlers never expose these
/// directly; they are translated into an `AppError` at the HTTP seam.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The targeted row does not exist (update/delete/find by id).
    #[error("record not found")]
    NotFound,

    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {constraint}")]
    Conflict { constraint: String },

    /// A foreign key constraint rejected the write.
    #[error("foreign key constraint violated: {constraint}")]
    InvalidReference { constraint: String },

    /// A delete was blocked because other rows still reference the record.
    #[error("record still referenced: {constraint}")]
    InUse { constraint: String },

    /// A row could not be turned into an audit snapshot.
    #[error("failed to snapshot record: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return RepoError::NotFound;
        }

        let classified = err.as_database_error().and_then(|db| {
            let constraint = db.constraint().unwrap_or_default().to_string();
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => Some(RepoError::Conflict { constraint }),
                Some(FOREIGN_KEY_VIOLATION) => Some(RepoError::InvalidReference { constraint }),
                _ => None,
            }
        });

        classified.unwrap_or(RepoError::Database(err))
    }
}

/// AppError
///
/// The HTTP error contract of the API:
/// - malformed input and validation failures map to 400 with a field-specific message,
/// - a missing or unresolvable user maps to 401,
/// - missing rows map to 404, unique violations and blocked deletes to 409,
/// - everything else is flattened to a generic 500. The detail is logged, never returned.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Translates a repository failure using the resource's own labels,
    /// so the client sees "Merchant not found" or "Email is already registered".
    pub fn from_repo<R: Resource>(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound(format!("{} not found", R::LABEL)),
            RepoError::Conflict { constraint } => AppError::Conflict(
                R::conflict_message(&constraint)
                    .unwrap_or("Record already exists")
                    .to_string(),
            ),
            RepoError::InvalidReference { constraint } => {
                tracing::warn!(table = R::TABLE, %constraint, "rejected dangling reference");
                AppError::BadRequest("Referenced record does not exist".to_string())
            }
            RepoError::InUse { constraint } => {
                tracing::info!(table = R::TABLE, %constraint, "delete blocked by dependent rows");
                AppError::Conflict(format!("{} is still referenced by other records", R::LABEL))
            }
            other => AppError::Internal(other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Record not found".to_string()),
            RepoError::Conflict { .. } => AppError::Conflict("Record already exists".to_string()),
            RepoError::InvalidReference { .. } => {
                AppError::BadRequest("Referenced record does not exist".to_string())
            }
            RepoError::InUse { .. } => {
                AppError::Conflict("Record is still referenced by other records".to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation { field, message } => json!({ "error": message, "field": field }),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
