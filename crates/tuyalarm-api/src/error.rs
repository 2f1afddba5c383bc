use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Platform codes that mean the request's credentials (not its content)
/// were rejected.
pub const AUTH_CODES: &[i64] = &[1004, 1010, 1011, 1013];

/// Platform codes that mean the cached access token is no longer usable.
pub(crate) const TOKEN_REJECTED_CODES: &[i64] = &[1010, 1011];

/// Coarse classification shared by every layer above the transport.
///
/// Callers decide retry policy and outward status codes from this alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Bad input shape or domain, caught before any network call.
    Validation,
    /// Connection failure or timeout.
    Network,
    /// Malformed or unexpected response body.
    Protocol,
    /// Access-token fetch or refresh failure.
    Auth,
    /// Business failure reported by the platform envelope.
    Api,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Network => "NETWORK",
            Self::Protocol => "PROTOCOL",
            Self::Auth => "AUTH",
            Self::Api => "API",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for the `tuyalarm-api` crate.
///
/// Covers every failure mode of the signed request pipeline: token
/// acquisition, transport, envelope decoding, and platform-reported errors.
/// `tuyalarm-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token fetch failed (bad credentials, network, or platform refusal).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Platform ────────────────────────────────────────────────────
    /// The envelope parsed and reported `success: false`.
    #[error("Platform error {code}: {message}")]
    Api { code: i64, message: String },

    /// The response body was not a platform envelope.
    #[error("Unexpected response (HTTP {status}): {message}")]
    Protocol {
        status: u16,
        message: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// The envelope's `result` did not match the expected shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request body could not be serialised for signing.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl Error {
    /// Classify this error into the shared [`ErrorKind`] taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Auth,
            Self::Transport(e) if e.is_decode() => ErrorKind::Protocol,
            Self::Transport(_) | Self::Timeout { .. } | Self::Tls(_) => ErrorKind::Network,
            Self::InvalidUrl(_) | Self::Encode(_) => ErrorKind::Validation,
            Self::Api { .. } => ErrorKind::Api,
            Self::Protocol { .. } | Self::Deserialization { .. } => ErrorKind::Protocol,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::Authentication { .. } => true,
            _ => false,
        }
    }

    /// Extract the platform error code, if available.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
