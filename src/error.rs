//! Error types for the library client

use serde::Deserialize;
use thiserror::Error;

/// Failure classes reported to views, one per source of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request never produced an HTTP response
    FetchError,
    /// 4xx: the server rejected the request
    ClientError,
    /// 5xx: the server failed
    ServerError,
    /// The response body could not be decoded
    ParsingError,
    /// The query was dropped before it resolved
    Cancelled,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FetchError => "FETCH_ERROR",
            ErrorCode::ClientError => "CLIENT_ERROR",
            ErrorCode::ServerError => "SERVER_ERROR",
            ErrorCode::ParsingError => "PARSING_ERROR",
            ErrorCode::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure of a remote call.
///
/// Every way a call can fail ends up here, so callers have a single error
/// path. Cloneable because one failure is fanned out to every subscriber of
/// a cache entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Query cancelled: {0}")]
    Cancelled(String),
}

/// Body the API sends with a non-2xx status
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    /// Build the error for a non-2xx response from its status and raw body.
    /// A body that is not the expected JSON shape simply yields no message.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());

        if status >= 500 {
            ApiError::Server { status, message }
        } else {
            ApiError::Rejected { status, message }
        }
    }

    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Network(_) => ErrorCode::FetchError,
            ApiError::Rejected { .. } => ErrorCode::ClientError,
            ApiError::Server { .. } => ErrorCode::ServerError,
            ApiError::Decode(_) => ErrorCode::ParsingError,
            ApiError::Cancelled(_) => ErrorCode::Cancelled,
        }
    }

    /// Server-provided message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } | ApiError::Server { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }

    /// Message for a user-facing notice: the server's own words, or `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.message().unwrap_or(fallback).to_string()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

impl AppError {
    /// Message for a user-facing notice.
    ///
    /// Validation failures surface the first field message, the way a form
    /// shows it under the offending input.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Api(e) => e.user_message(fallback),
            AppError::Validation(errors) => {
                let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
                fields.sort_by(|a, b| a.0.cmp(&b.0));
                fields
                    .into_iter()
                    .flat_map(|(_, errs)| errs.iter())
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| fallback.to_string())
            }
            AppError::BusinessRule(msg) => msg.clone(),
            AppError::Config(_) => fallback.to_string(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
