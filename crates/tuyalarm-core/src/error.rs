// ── Core error types ──
//
// User-facing errors from tuyalarm-core. Consumers never see reqwest or
// serde failures directly; the `From<tuyalarm_api::Error>` impl folds
// transport-layer errors into the five-kind taxonomy.

use thiserror::Error;
use tuyalarm_api::{AUTH_CODES, ErrorKind};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach platform: {reason}")]
    Network { reason: String },

    #[error("Platform request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Response errors ──────────────────────────────────────────────
    #[error("Unexpected platform response: {message}")]
    Protocol { message: String },

    #[error("Platform error {code}: {message}")]
    Api { code: i64, message: String },
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Classify into the shared [`ErrorKind`] taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::Config { .. } => ErrorKind::Validation,
            Self::Network { .. } | Self::Timeout { .. } => ErrorKind::Network,
            Self::Authentication { .. } => ErrorKind::Auth,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Api { .. } => ErrorKind::Api,
        }
    }

    /// Platform error code, for API errors.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the platform rejected the credentials rather than the request.
    pub fn is_auth_rejection(&self) -> bool {
        self.api_code().is_some_and(|code| AUTH_CODES.contains(&code))
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tuyalarm_api::Error> for CoreError {
    fn from(err: tuyalarm_api::Error) -> Self {
        use tuyalarm_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::Authentication { message },
            ApiError::Transport(ref e) if e.is_decode() => CoreError::Protocol {
                message: e.to_string(),
            },
            ApiError::Transport(e) => CoreError::Network {
                reason: e.to_string(),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Tls(msg) => CoreError::Network {
                reason: format!("TLS error: {msg}"),
            },
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Encode(e) => CoreError::Validation {
                message: format!("request body could not be encoded: {e}"),
            },
            ApiError::Api { code, message } => CoreError::Api { code, message },
            ApiError::Protocol {
                status, message, ..
            } => CoreError::Protocol {
                message: format!("HTTP {status}: {message}"),
            },
            ApiError::Deserialization { message, body: _ } => CoreError::Protocol {
                message: format!("Deserialization error: {message}"),
            },
        }
    }
}
