//! Error types for the Bull Feed engine
//!
//! Ranking itself never fails: malformed records are defaulted at decode time.
//! Errors come from the edges (configuration, snapshot input, request
//! parameters) and map onto HTTP responses for the API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;

/// Result type alias for Bull Feed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Bull Feed engine
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        key: &'static str,
        message: Cow<'static, str>,
    },

    // ========================================================================
    // Request Errors
    // ========================================================================
    #[error("Unknown feed strategy '{value}' (expected hot, top, smart_money or fresh)")]
    InvalidStrategy { value: String },

    #[error("Unknown market '{value}' (expected forex, crypto, stocks or indices)")]
    InvalidMarket { value: String },

    #[error("Unknown content type '{value}' (expected deep_dive, market_pulse or blog_post)")]
    InvalidContentType { value: String },

    #[error("Unknown reaction '{value}' (expected bull, bear or save)")]
    InvalidReaction { value: String },

    #[error("Invalid timestamp '{value}': expected RFC 3339")]
    InvalidTimestamp { value: String },

    #[error("Bad request: {message}")]
    BadRequest { message: Cow<'static, str> },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    // ========================================================================
    // Snapshot Errors
    // ========================================================================
    #[error("Failed to read snapshot {path}: {source}")]
    Snapshot {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Upstream error: {message}")]
    Upstream { message: Cow<'static, str> },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data format: {message}")]
    InvalidFormat { message: Cow<'static, str> },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Internal server error")]
    Internal {
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create an internal error
    pub fn internal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal {
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this error should be logged at error level
    pub fn is_error_level(&self) -> bool {
        matches!(
            self,
            Error::Internal { .. } | Error::Other(_) | Error::Snapshot { .. } | Error::Upstream { .. }
        )
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidStrategy { .. }
            | Error::InvalidMarket { .. }
            | Error::InvalidContentType { .. }
            | Error::InvalidReaction { .. }
            | Error::InvalidTimestamp { .. }
            | Error::BadRequest { .. }
            | Error::InvalidFormat { .. }
            | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidConfig { .. } => "CONFIG_ERROR",
            Error::InvalidStrategy { .. } => "INVALID_STRATEGY",
            Error::InvalidMarket { .. } => "INVALID_MARKET",
            Error::InvalidContentType { .. } => "INVALID_CONTENT_TYPE",
            Error::InvalidReaction { .. } => "INVALID_REACTION",
            Error::InvalidTimestamp { .. } => "INVALID_TIMESTAMP",
            Error::BadRequest { .. } => "BAD_REQUEST",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Snapshot { .. } => "SNAPSHOT_ERROR",
            Error::Upstream { .. } => "UPSTREAM_ERROR",
            Error::Json(_) | Error::InvalidFormat { .. } => "SERIALIZATION_ERROR",
            Error::Internal { .. } | Error::Other(_) => "INTERNAL_ERROR",
        }
    }
}

// ============================================================================
// Error Response for API
// ============================================================================

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_error_level() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        // Don't expose internal error details
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}
