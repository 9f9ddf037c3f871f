/// Error types for site-publisher
///
/// Every failure surfaces as one of these variants; the HTTP layer maps them
/// to status codes through `ResponseError`.
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for site-publisher operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Stage of an operation that talks to the object store, the CDN or the
/// document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Upload,
    Cleanup,
    ListFiles,
    MediaUpload,
    MediaList,
    DistributionCreate,
    DistributionLookup,
    DistributionDisable,
    DistributionDelete,
    Invalidation,
    StorageTeardown,
    DocumentDelete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Upload => "upload",
            Phase::Cleanup => "cleanup",
            Phase::ListFiles => "list_files",
            Phase::MediaUpload => "media_upload",
            Phase::MediaList => "media_list",
            Phase::DistributionCreate => "distribution_create",
            Phase::DistributionLookup => "distribution_lookup",
            Phase::DistributionDisable => "distribution_disable",
            Phase::DistributionDelete => "distribution_delete",
            Phase::Invalidation => "invalidation",
            Phase::StorageTeardown => "storage_teardown",
            Phase::DocumentDelete => "document_delete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A teardown phase that did not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub message: String,
}

impl fmt::Display for PhaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.phase, self.message)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("CloudFront distribution {0} is still enabled; disable it and wait for the change to deploy before deleting")]
    DistributionEnabled(String),

    #[error("Upstream error during {phase}: {message}")]
    Upstream { phase: Phase, message: String },

    #[error("Teardown incomplete: {}", format_failures(.0))]
    TeardownIncomplete(Vec<PhaseFailure>),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn upstream(phase: Phase, err: impl fmt::Display) -> Self {
        AppError::Upstream {
            phase,
            message: err.to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "AUTHORIZATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::DistributionEnabled(_) => "DISTRIBUTION_ENABLED",
            AppError::Upstream { .. } => "UPSTREAM_ERROR",
            AppError::TeardownIncomplete(_) => "TEARDOWN_INCOMPLETE",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

fn format_failures(failures: &[PhaseFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PhaseFailure>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::DistributionEnabled(_) => StatusCode::CONFLICT,
            AppError::Upstream { .. } | AppError::TeardownIncomplete(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (phase, failures) = match self {
            AppError::Upstream { phase, .. } => (Some(*phase), Vec::new()),
            AppError::TeardownIncomplete(failures) => (None, failures.clone()),
            _ => (None, Vec::new()),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
            status: status.as_u16(),
            phase,
            failures,
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
