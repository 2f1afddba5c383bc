//! CLI error types with miette diagnostics.
//!
//! Covers everything that fails before an operation runs (configuration,
//! client construction) or while printing its result. Operation failures
//! themselves are reported through the response envelope.

use miette::Diagnostic;
use thiserror::Error;

use tuyalarm_config::ConfigError;
use tuyalarm_core::{CoreError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("No {field} configured")]
    #[diagnostic(
        code(tuyalarm::no_credentials),
        help(
            "Set TUYA_ACCESS_ID and TUYA_ACCESS_SECRET, pass --access-id / --access-secret,\n\
             or add them to {path}.\n\
             The secret may also live in the system keyring (service 'tuyalarm', user 'access-secret')."
        )
    )]
    NoCredentials { field: String, path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tuyalarm::validation))]
    Validation { field: String, reason: String },

    #[error("Config loading failed: {source}")]
    #[diagnostic(code(tuyalarm::config), help("Check the TOML syntax in {path}."))]
    Config {
        #[source]
        source: Box<figment::Error>,
        path: String,
    },

    // ── Client ───────────────────────────────────────────────────────
    #[error("Could not initialise the platform client: {message}")]
    #[diagnostic(
        code(tuyalarm::client),
        help("If ca_cert is configured, check that the file exists and is PEM encoded.")
    )]
    Client { message: String },

    // ── Output ───────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    #[diagnostic(code(tuyalarm::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    #[diagnostic(code(tuyalarm::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } | Self::Config { .. } => exit_code::USAGE,
            Self::Client { .. } => exit_code::CONNECTION,
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) => exit_code::GENERAL,
        }
    }

    pub fn from_config(err: ConfigError, path: String) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::MissingCredential { field } => Self::NoCredentials { field, path },
            ConfigError::Figment(source) => Self::Config { source, path },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::Client {
            message: err.to_string(),
        }
    }
}

/// Exit code for an operation that failed with `kind`.
pub fn exit_code_for(kind: ErrorKind, auth_rejection: bool) -> i32 {
    match kind {
        ErrorKind::Validation => exit_code::USAGE,
        ErrorKind::Auth => exit_code::AUTH,
        ErrorKind::Api if auth_rejection => exit_code::AUTH,
        ErrorKind::Network => exit_code::CONNECTION,
        ErrorKind::Protocol | ErrorKind::Api => exit_code::GENERAL,
    }
}
