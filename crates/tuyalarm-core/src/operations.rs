// ── Device operations ──
//
// The procedural surface the route layer calls. Every input is validated
// into typed `Command`s before the dispatcher is touched, so a rejected
// request never produces network traffic.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use tuyalarm_api::{Clock, CommandPayload, SystemClock, TokenCache, TuyaClient};

use crate::config::AlarmConfig;
use crate::error::CoreError;
use crate::model::command::{
    AlarmDuration, BrightnessLevel, Command, CommandCode, MasterMode, VolumeLevel, parse_level,
};
use crate::model::preset::{Bundle, Preset, PresetInfo, all_presets, mode_commands};
use crate::model::status::DeviceStatus;

/// Outcome of a credential check.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialCheck {
    pub valid: bool,
    pub endpoint: String,
    /// Shortened access id.
    pub access_id: String,
    pub token_expires_at: DateTime<Utc>,
}

/// Façade over the signed client.
///
/// Cheaply cloneable; clones share one client and therefore one token cache.
#[derive(Clone)]
pub struct DeviceOperations {
    client: Arc<TuyaClient>,
}

impl DeviceOperations {
    /// Build a client on the system clock from configuration.
    pub fn new(config: &AlarmConfig) -> Result<Self, CoreError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build a client whose token cache and signing timestamps use `clock`.
    pub fn with_clock(config: &AlarmConfig, clock: Arc<dyn Clock>) -> Result<Self, CoreError> {
        let tokens = Arc::new(TokenCache::new(clock, config.token_margin));
        let client = TuyaClient::with_tokens(config.credentials(), &config.transport(), tokens)?;
        Ok(Self::with_client(Arc::new(client)))
    }

    pub fn with_client(client: Arc<TuyaClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<TuyaClient> {
        &self.client
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn list_devices(&self) -> Result<Value, CoreError> {
        Ok(self.client.list_devices().await?)
    }

    /// Raw device detail, including its `status` array.
    pub async fn get_device(&self, device_id: &str) -> Result<Value, CoreError> {
        validate_device_id(device_id)?;
        Ok(self.client.get_device_raw(device_id).await?)
    }

    /// Device detail plus flattened status and derived labels.
    ///
    /// The detail is the typed device re-serialised, so the LAN
    /// `local_key` never appears in it.
    pub async fn get_status(&self, device_id: &str) -> Result<DeviceStatus, CoreError> {
        validate_device_id(device_id)?;
        let device = self.client.get_device(device_id).await?;
        debug!(device_id, points = device.status.len(), "normalising device status");

        let detail = serde_json::to_value(&device).map_err(|e| CoreError::Protocol {
            message: format!("device detail could not be re-encoded: {e}"),
        })?;
        Ok(DeviceStatus::new(device_id, detail, &device.status))
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Send caller-supplied `{code, value}` pairs after validating each one.
    pub async fn send_commands(
        &self,
        device_id: &str,
        commands: &[CommandPayload],
    ) -> Result<Value, CoreError> {
        let commands = commands
            .iter()
            .map(Command::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.execute(device_id, &commands).await
    }

    /// Send an already-validated command batch.
    pub async fn execute(&self, device_id: &str, commands: &[Command]) -> Result<Value, CoreError> {
        validate_device_id(device_id)?;
        if commands.is_empty() {
            return Err(CoreError::validation("command batch is empty"));
        }

        let payloads: Vec<CommandPayload> = commands.iter().map(Command::to_payload).collect();
        let summary: Vec<String> = commands.iter().map(ToString::to_string).collect();
        debug!(device_id, commands = %summary.join(", "), "dispatching command batch");
        Ok(self.client.send_commands(device_id, &payloads).await?)
    }

    /// Full siren + strobe, SOS mode.
    pub async fn activate_alarm(&self, device_id: &str) -> Result<Value, CoreError> {
        info!(device_id, "activating alarm");
        self.execute(device_id, &Bundle::Emergency.commands()).await
    }

    pub async fn deactivate_alarm(&self, device_id: &str) -> Result<Value, CoreError> {
        info!(device_id, "deactivating alarm");
        self.execute(device_id, &Bundle::Deactivate.commands()).await
    }

    /// Short wake-up alarm.
    pub async fn time_to_work(&self, device_id: &str) -> Result<Value, CoreError> {
        info!(device_id, "sending time-to-work alarm");
        self.execute(device_id, &Bundle::TimeToWork.commands()).await
    }

    pub async fn set_volume(&self, device_id: &str, level: &str) -> Result<Value, CoreError> {
        let level: VolumeLevel = parse_level(CommandCode::AlarmVolume, level)?;
        self.execute(device_id, &[Command::AlarmVolume(level)]).await
    }

    pub async fn set_brightness(&self, device_id: &str, level: &str) -> Result<Value, CoreError> {
        let level: BrightnessLevel = parse_level(CommandCode::BrightState, level)?;
        self.execute(device_id, &[Command::BrightState(level)]).await
    }

    /// Switch master mode. `arm` and `disarmed` also set the arming flags.
    pub async fn set_mode(&self, device_id: &str, mode: &str) -> Result<Value, CoreError> {
        let mode: MasterMode = parse_level(CommandCode::MasterMode, mode)?;
        self.execute(device_id, &mode_commands(mode)).await
    }

    pub async fn set_duration(&self, device_id: &str, seconds: i64) -> Result<Value, CoreError> {
        let duration = AlarmDuration::new(seconds)?;
        self.execute(device_id, &[Command::AlarmTime(duration)]).await
    }

    pub async fn apply_preset(&self, device_id: &str, name: &str) -> Result<Value, CoreError> {
        let preset = Preset::parse(name)?;
        info!(device_id, preset = preset.as_str(), "applying preset");
        self.execute(device_id, &preset.commands()).await
    }

    // ── Meta ─────────────────────────────────────────────────────────

    /// Make sure the credentials can obtain a token.
    pub async fn check_credentials(&self) -> Result<CredentialCheck, CoreError> {
        let token_expires_at = self.client.verify_credentials().await?;
        let credentials = self.client.credentials();
        Ok(CredentialCheck {
            valid: true,
            endpoint: credentials.endpoint.to_string(),
            access_id: credentials.redacted_id(),
            token_expires_at,
        })
    }

    pub fn presets() -> Vec<PresetInfo> {
        all_presets()
    }
}

/// Device ids end up in the request path, so only `[A-Za-z0-9_-]` passes.
pub fn validate_device_id(device_id: &str) -> Result<(), CoreError> {
    if device_id.is_empty() {
        return Err(CoreError::validation("device id must not be empty"));
    }
    if !device_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(CoreError::validation(format!(
            "device id '{device_id}' may only contain letters, digits, '_' and '-'"
        )));
    }
    Ok(())
}
