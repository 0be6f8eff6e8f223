use shared::error::ErrorBody;
use thiserror::Error;

/// Failure reported by an [`crate::AccountApi`] transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    #[error("request rejected with status {status}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// How the body of a rejected request becomes the screen's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDecoding {
    /// Raw response text, then the default.
    RawText,
    /// JSON `error` field, then raw text, then the default.
    JsonThenText,
}

impl ApiFailure {
    pub fn into_account_error(self, decoding: ErrorDecoding, default: &str) -> AccountError {
        match self {
            Self::Status { status, body } => {
                let body = ErrorBody::decode(&body);
                let message = match decoding {
                    ErrorDecoding::RawText => body.text_or(default),
                    ErrorDecoding::JsonThenText => body.message_or(default),
                };
                AccountError::Rejected { status, message }
            }
            Self::Transport(message) => AccountError::Transport(message),
            Self::Decode(message) => AccountError::Decode(message),
        }
    }
}

/// Input problems caught before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("select an image file first")]
    NoAvatarSelected,
    #[error("avatar is {size} bytes; the limit is {max} bytes")]
    AvatarTooLarge { size: usize, max: usize },
    #[error("enter a new username")]
    EmptyNewUsername,
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("username is too long (max {max} characters)")]
    UsernameTooLong { max: usize },
    #[error("social account row {index} does not exist ({len} rows)")]
    SocialIndexOutOfRange { index: usize, len: usize },
}

/// Outcome of a screen action. Cloneable so a shared in-flight request can
/// hand the same result to every caller awaiting it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("you must log in first")]
    Unauthenticated,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(String),
    #[error("screen was closed before the request completed")]
    Disposed,
    #[error("action task stopped unexpectedly: {0}")]
    Interrupted(String),
}

impl AccountError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
