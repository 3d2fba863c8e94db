use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The batch target could not be resolved; nothing was sent.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Redis error: {0}")]
    RedisError(String),

    #[error("Reply address error: {0}")]
    Codec(#[from] CodecError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("JWT error: {0}")]
    JwtError(String),
}

/// Failures decoding a reply address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Wrong shape, bad hex, or the ciphertext did not authenticate.
    #[error("malformed reply address: {0}")]
    Format(String),

    /// An identifier contains the `|` delimiter and could not round-trip.
    #[error("identifier {0:?} contains the reply address delimiter")]
    Identifier(String),

    /// Decrypted cleanly but the salt prefix did not match.
    #[error("reply address salt mismatch (forged, corrupted or issued under another key)")]
    Integrity,
}

/// Failures reported by the templated-mail provider. `Display` is the
/// provider's own message, surfaced as-is in batch outcomes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailError {
    #[error("{0}")]
    Transport(String),

    #[error("{body}")]
    Rejected { status: u16, body: String },
}

/// Per-recipient failure inside an invitation batch. Never escapes the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipientError {
    #[error("not a valid email address")]
    InvalidAddress,

    #[error(transparent)]
    Send(#[from] MailError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Precondition(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::RedisError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Codec(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Mail(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::JwtError(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::RedisError(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for AppError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        AppError::RedisError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::JwtError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
