// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ─── Credentials ─────────────────────────────────────────────
    #[error("Authorization header missing")]
    MissingHeader,

    #[error("Invalid authorization header format, expected 'Bearer <token>'")]
    InvalidHeaderFormat,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("User account is inactive")]
    InactiveAccount,

    #[error("Multiple users found with the same credential")]
    AmbiguousCredential,

    // ─── Token verification ──────────────────────────────────────
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unknown signing key: {0}")]
    UnknownSigningKey(String),

    #[error("Token use is not 'access'")]
    WrongTokenUse,

    #[error("Token issuer mismatch: {0}")]
    IssuerMismatch(String),

    #[error("No username claim in token")]
    NoIdentityClaim,

    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    // ─── Set ledger ──────────────────────────────────────────────
    #[error("Batch contains no sets")]
    EmptyBatch,

    #[error("Batch of {count} sets exceeds the limit of {max}")]
    BatchTooLarge { count: usize, max: usize },

    #[error("workoutId and timestamp are required")]
    InvalidIdentity,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // ─── Trend / injury ──────────────────────────────────────────
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Body part location not found: {0}")]
    LocationNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    // ─── Collaborators ───────────────────────────────────────────
    #[error("Database error: {0}")]
    Database(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable error kind used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingHeader => "missing_header",
            AppError::InvalidHeaderFormat => "invalid_header_format",
            AppError::InvalidCredential => "invalid_credential",
            AppError::InactiveAccount => "inactive_account",
            AppError::AmbiguousCredential => "ambiguous_credential",
            AppError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            AppError::UnknownSigningKey(_) => "unknown_signing_key",
            AppError::WrongTokenUse => "wrong_token_use",
            AppError::IssuerMismatch(_) => "issuer_mismatch",
            AppError::NoIdentityClaim => "no_identity_claim",
            AppError::InvalidToken(_) => "invalid_token",
            AppError::EmptyBatch => "empty_batch",
            AppError::BatchTooLarge { .. } => "batch_too_large",
            AppError::InvalidIdentity => "invalid_identity",
            AppError::NotFound(_) => "not_found",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::InsufficientData(_) => "insufficient_data",
            AppError::LocationNotFound(_) => "location_not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Database(_) => "database_error",
            AppError::Queue(_) => "queue_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingHeader
            | AppError::InvalidHeaderFormat
            | AppError::InvalidCredential
            | AppError::UnsupportedAlgorithm(_)
            | AppError::UnknownSigningKey(_)
            | AppError::WrongTokenUse
            | AppError::IssuerMismatch(_)
            | AppError::NoIdentityClaim
            | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::InactiveAccount => StatusCode::FORBIDDEN,
            AppError::EmptyBatch
            | AppError::BatchTooLarge { .. }
            | AppError::InvalidIdentity
            | AppError::InsufficientData(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::LocationNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::AmbiguousCredential
            | AppError::Database(_)
            | AppError::Queue(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures of an external collaborator (storage, queue, network).
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Queue(_) | AppError::Internal(_)
        )
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let details = match &self {
            AppError::AmbiguousCredential => {
                tracing::error!("Data integrity violation: credential matches multiple users");
                None
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                None
            }
            AppError::Queue(msg) => {
                tracing::error!(error = %msg, "Queue error");
                None
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
            // Auth failures get a kind only; the reason is logged by the middleware.
            _ if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => None,
            other => Some(other.to_string()),
        };

        let body = ErrorResponse {
            error: self.kind().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
