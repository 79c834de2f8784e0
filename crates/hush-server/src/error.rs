//! Command errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use hush_crypto::CryptoError;
use hush_ledger::LedgerError;
use hush_results::ResultsError;
use hush_types::StoreError;

/// Outcome taxonomy for every command.
///
/// All variants except [`CommandError::Infrastructure`] are expected results
/// and carry a short caller-facing message.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Survey not found")]
    NotFound,

    #[error("Survey is not active")]
    InactiveSurvey,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token already used")]
    TokenAlreadyUsed,

    #[error("Insufficient responses. Need {need}, have {have}.")]
    InsufficientResponses { need: u32, have: u64 },

    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Store, ledger or protector failure. Detail goes to logs only.
    #[error("internal error: {0}")]
    Infrastructure(String),
}

impl CommandError {
    pub fn status(&self) -> StatusCode {
        match self {
            CommandError::NotFound => StatusCode::NOT_FOUND,
            CommandError::InsufficientResponses { .. } => StatusCode::FORBIDDEN,
            CommandError::Unauthorized => StatusCode::UNAUTHORIZED,
            CommandError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CommandError::InactiveSurvey
            | CommandError::InvalidToken
            | CommandError::TokenAlreadyUsed
            | CommandError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            CommandError::Infrastructure(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CommandError::Validation(msg.into())
    }
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        if let CommandError::Infrastructure(detail) = &self {
            tracing::error!(%detail, "command failed");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        CommandError::Infrastructure(err.to_string())
    }
}

impl From<LedgerError> for CommandError {
    fn from(err: LedgerError) -> Self {
        CommandError::Infrastructure(err.to_string())
    }
}

impl From<CryptoError> for CommandError {
    fn from(err: CryptoError) -> Self {
        CommandError::Infrastructure(err.to_string())
    }
}

impl From<ResultsError> for CommandError {
    fn from(err: ResultsError) -> Self {
        CommandError::Infrastructure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;
