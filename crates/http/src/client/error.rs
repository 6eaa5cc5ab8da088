//! Client error types and the failure classifier

use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Route the UI must navigate to once a session is gone
pub const LOGIN_ROUTE: &str = "/login";

/// 401 messages the backend uses for reasons other than an expired session
const ACCOUNT_MESSAGES: &[&str] = &["Account does not exist"];

/// Why the pipeline gave up on the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExpiryReason {
    /// The refresh token, login id or user id was missing
    MissingCredentials,
    /// The refresh endpoint answered without a usable token
    RefreshRejected,
    /// The refresh call itself failed
    RefreshFailed,
    /// The backend answered 401 to a guarded request
    Unauthorized,
}

impl fmt::Display for SessionExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingCredentials => "missing refresh token or user identifiers",
            Self::RefreshRejected => "refresh rejected",
            Self::RefreshFailed => "refresh request failed",
            Self::Unauthorized => "unauthorized",
        };
        f.write_str(text)
    }
}

/// Session expiry notice handed to callers and to the expiry hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExpired {
    pub reason: SessionExpiryReason,
    /// Where the UI should send the user next
    pub redirect_to: &'static str,
}

impl SessionExpired {
    pub const fn new(reason: SessionExpiryReason) -> Self {
        Self {
            reason,
            redirect_to: LOGIN_ROUTE,
        }
    }
}

impl fmt::Display for SessionExpired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (redirect to {})", self.reason, self.redirect_to)
    }
}

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Server returned any other error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Input rejected before any request was made
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The session is gone and the user must sign in again
    #[error("Session expired: {0}")]
    SessionExpired(SessionExpired),
}

/// Closed set of error categories for call-site matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Server,
    Decode,
    Configuration,
    Validation,
    SessionExpired,
}

impl ClientError {
    /// Create error from HTTP status code and the server's message
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Request(_) => ErrorKind::Network,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::AuthenticationFailed(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::ServerError { .. } => ErrorKind::Server,
            Self::Serialization(_) => ErrorKind::Decode,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Validation(_) => ErrorKind::Validation,
            Self::SessionExpired(_) => ErrorKind::SessionExpired,
        }
    }

    /// True when the user has to sign in again
    pub const fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed(_) | Self::SessionExpired(_)
        )
    }

    /// Text suitable for a toast or inline error
    pub fn user_message(&self) -> String {
        match self {
            Self::BadRequest(message) => {
                non_empty_or(message, "Bad request. Please check your input.")
            }
            Self::AuthenticationFailed(message) => {
                if ACCOUNT_MESSAGES.contains(&message.as_str()) {
                    message.clone()
                } else {
                    "Your session has expired. Please log in to continue.".to_string()
                }
            }
            Self::SessionExpired(_) => {
                "Your session has expired. Please log in to continue.".to_string()
            }
            Self::Forbidden(message) => {
                non_empty_or(message, "You don't have permission to access this resource")
            }
            Self::NotFound(_) => "Requested resource not found.".to_string(),
            Self::ServerError { status: 500, .. } => {
                "Server error. Please try again later.".to_string()
            }
            Self::ServerError { message, .. } | Self::Validation(message) => {
                non_empty_or(message, "An unexpected error occurred.")
            }
            Self::Request(_) | Self::Serialization(_) | Self::Configuration(_) => {
                "An unexpected error occurred.".to_string()
            }
        }
    }
}

fn non_empty_or(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}

/// A failed exchange, before classification
#[derive(Debug)]
pub enum ApiFailure {
    /// The request never produced a response
    Transport(reqwest::Error),
    /// The server answered with a non-success status
    Status { status: StatusCode, body: String },
    /// A success response whose body did not match the expected shape
    Decode(serde_json::Error),
}

/// Maps raw failures to normalized errors
///
/// The pipeline calls `handle` exactly once per failed response and returns
/// its result to the caller unchanged.
pub trait ErrorClassifier: Send + Sync {
    fn handle(&self, failure: ApiFailure) -> ClientError;
}

/// Default classifier for the backend's `{message}` error bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiErrorClassifier;

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorClassifier {
    /// Pull the server's message out of an error body
    ///
    /// JSON `{message}` wins, then the raw text, then the status reason.
    pub fn extract_message(status: StatusCode, body: &str) -> String {
        if let Ok(ErrorBody { message: Some(message) }) = serde_json::from_str(body) {
            return message;
        }
        let trimmed = body.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('{') {
            return trimmed.to_string();
        }
        status
            .canonical_reason()
            .map_or_else(|| status.to_string(), str::to_string)
    }
}

impl ErrorClassifier for ApiErrorClassifier {
    fn handle(&self, failure: ApiFailure) -> ClientError {
        match failure {
            ApiFailure::Transport(err) => ClientError::Request(err),
            ApiFailure::Status { status, body } => {
                ClientError::from_status(status, Self::extract_message(status, &body))
            }
            ApiFailure::Decode(err) => ClientError::Serialization(err),
        }
    }
}
