//! CLI flag overlay on top of `tuyalarm-config`.
//!
//! Flags beat the environment, which beats the file. Core never sees any
//! of this; it receives a finished `AlarmConfig`.

use std::path::PathBuf;

use clap::ValueEnum;
use secrecy::SecretString;

use tuyalarm_config::{Config, config_path, load_config_from, resolve_secret, to_alarm_config};
use tuyalarm_core::AlarmConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Merged configuration plus the file it was read from.
pub struct Loaded {
    pub config: Config,
    pub path: PathBuf,
}

impl Loaded {
    fn path_display(&self) -> String {
        self.path.display().to_string()
    }
}

pub fn load(global: &GlobalOpts) -> Result<Loaded, CliError> {
    let path = global.config.clone().unwrap_or_else(config_path);
    let mut config = load_config_from(&path)
        .map_err(|e| CliError::from_config(e, path.display().to_string()))?;

    if let Some(ref endpoint) = global.endpoint {
        config.endpoint.clone_from(endpoint);
    }
    if let Some(ref access_id) = global.access_id {
        config.access_id = Some(access_id.clone());
    }
    if let Some(timeout) = global.timeout {
        config.timeout = timeout;
    }

    Ok(Loaded { config, path })
}

/// `--output`, else the configured default.
pub fn output_format(global: &GlobalOpts, loaded: &Loaded) -> Result<OutputFormat, CliError> {
    if let Some(format) = global.output {
        return Ok(format);
    }
    OutputFormat::from_str(&loaded.config.output, true).map_err(|reason| CliError::Validation {
        field: "output".into(),
        reason,
    })
}

/// Resolve credentials (flag secret first) and build the core config.
pub fn alarm_config(global: &GlobalOpts, loaded: &Loaded) -> Result<AlarmConfig, CliError> {
    if loaded.config.access_id.as_deref().is_none_or(str::is_empty) {
        return Err(CliError::NoCredentials {
            field: "access_id".into(),
            path: loaded.path_display(),
        });
    }
    let secret = match global.access_secret {
        Some(ref secret) => SecretString::from(secret.clone()),
        None => resolve_secret(&loaded.config)
            .map_err(|e| CliError::from_config(e, loaded.path_display()))?,
    };
    to_alarm_config(&loaded.config, secret).map_err(|e| CliError::from_config(e, loaded.path_display()))
}
