//! Configuration for the tuyalarm CLI.
//!
//! One TOML file plus `TUYA_*` environment overrides, secret resolution
//! (env var indirection + keyring + plaintext), and translation to
//! `tuyalarm_core::AlarmConfig`. The CLI layers its flags on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tuyalarm_api::{DEFAULT_ENDPOINT, TlsMode};
use tuyalarm_core::AlarmConfig;

/// Keyring service name; the secret lives under [`KEYRING_USER`].
pub const KEYRING_SERVICE: &str = "tuyalarm";
pub const KEYRING_USER: &str = "access-secret";

/// Environment prefix for overrides (`TUYA_ACCESS_ID`, `TUYA_ENDPOINT`, ...).
pub const ENV_PREFIX: &str = "TUYA_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {field} configured")]
    MissingCredential { field: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Effective configuration after merging defaults, file, and environment.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// OpenAPI base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    pub access_id: Option<String>,

    /// Plaintext secret (prefer keyring or `access_secret_env`).
    pub access_secret: Option<String>,

    /// Name of an environment variable holding the secret.
    pub access_secret_env: Option<String>,

    /// Total request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Seconds before expiry at which a token is refreshed.
    #[serde(default = "default_token_margin")]
    pub token_margin: u64,

    /// Extra CA certificate (PEM) to trust.
    pub ca_cert: Option<PathBuf>,

    /// Default output format.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            access_id: None,
            access_secret: None,
            access_secret_env: None,
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            token_margin: default_token_margin(),
            ca_cert: None,
            output: default_output(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}
fn default_timeout() -> u64 {
    10
}
fn default_connect_timeout() -> u64 {
    5
}
fn default_token_margin() -> u64 {
    60
}
fn default_output() -> String {
    "json".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tuyalarm", "tuyalarm").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tuyalarm");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Layered provider: defaults, then `path`, then `TUYA_*` variables.
///
/// Keys map one-to-one (`TUYA_ACCESS_SECRET_ENV` → `access_secret_env`),
/// so the environment provider does not split on `_`.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
}

/// Load from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment(path).extract()?)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the access secret: `access_secret_env` → keyring → plaintext.
pub fn resolve_secret(config: &Config) -> Result<SecretString, ConfigError> {
    // 1. Indirection through a named env var
    if let Some(ref env_name) = config.access_secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext (file or TUYA_ACCESS_SECRET)
    if let Some(ref secret) = config.access_secret {
        if !secret.is_empty() {
            return Ok(SecretString::from(secret.clone()));
        }
    }

    Err(ConfigError::MissingCredential {
        field: "access_secret".into(),
    })
}

/// Build an `AlarmConfig` with an already-resolved secret.
pub fn to_alarm_config(
    config: &Config,
    access_secret: SecretString,
) -> Result<AlarmConfig, ConfigError> {
    let access_id = config
        .access_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ConfigError::MissingCredential {
            field: "access_id".into(),
        })?;

    let endpoint: url::Url = config
        .endpoint
        .parse()
        .map_err(|e| ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("invalid URL '{}': {e}", config.endpoint),
        })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("expected an http(s) URL, got '{}'", config.endpoint),
        });
    }

    // Request paths replace the endpoint's path rather than extend it.
    if endpoint.path() != "/" || endpoint.query().is_some() {
        return Err(ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!(
                "expected a bare origin such as {DEFAULT_ENDPOINT}, got '{}'",
                config.endpoint
            ),
        });
    }

    if config.timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }
    let token_margin = i64::try_from(config.token_margin)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| ConfigError::Validation {
            field: "token_margin".into(),
            reason: format!("{} seconds is out of range", config.token_margin),
        })?;

    let mut alarm = AlarmConfig::new(access_id, access_secret, endpoint);
    alarm.timeout = Duration::from_secs(config.timeout);
    alarm.connect_timeout = Duration::from_secs(config.connect_timeout.max(1));
    alarm.token_margin = token_margin;
    if let Some(ref ca) = config.ca_cert {
        alarm.tls = TlsMode::CustomCa(ca.clone());
    }
    Ok(alarm)
}

/// Resolve the secret and build an `AlarmConfig` in one step.
pub fn alarm_config(config: &Config) -> Result<AlarmConfig, ConfigError> {
    let secret = resolve_secret(config)?;
    to_alarm_config(config, secret)
}
