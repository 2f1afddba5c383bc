// ── Device status normalisation ──
//
// Flattens the platform's `[{code, value}]` status array into a map and
// derives human-facing labels from the raw data points.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tuyalarm_api::StatusEntry;

use crate::model::command::{AlarmState, BrightnessLevel, CommandCode, MasterMode, VolumeLevel};

/// Read-only data points reported by the device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusCode {
    BatteryPercentage,
    BatteryValue,
    BatteryState,
    ChargeState,
    CheckingResult,
    Preheat,
    Lifecycle,
    TemperAlarm,
}

impl StatusCode {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Coarse battery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatteryBand {
    Low,
    Middle,
    High,
}

impl BatteryBand {
    /// `0..=20` low, `21..=60` middle, `61..=100` high.
    pub fn from_percentage(percent: i64) -> Option<Self> {
        match percent {
            0..=20 => Some(Self::Low),
            21..=60 => Some(Self::Middle),
            61..=100 => Some(Self::High),
            _ => None,
        }
    }
}

/// Labels derived from the raw data points. Absent points stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusLabels {
    pub armed: Option<bool>,
    pub alarm_active: Option<bool>,
    pub master_mode: Option<MasterMode>,
    pub alarm_state: Option<AlarmState>,
    pub volume: Option<VolumeLevel>,
    pub brightness: Option<BrightnessLevel>,
    pub alarm_duration_secs: Option<u8>,
    pub battery_percentage: Option<i64>,
    pub battery_state: Option<BatteryBand>,
    pub charging: Option<bool>,
    pub tamper_alarm: Option<bool>,
}

/// The `status` view of a device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatus {
    pub device_id: String,
    /// Raw device object as returned by the platform.
    pub device: Value,
    /// `code -> value`, last entry wins on duplicates.
    pub formatted_status: Map<String, Value>,
    pub labels: StatusLabels,
}

impl DeviceStatus {
    pub fn new(device_id: impl Into<String>, device: Value, status: &[StatusEntry]) -> Self {
        let formatted_status = flatten(status);
        let labels = StatusLabels::from_status(&formatted_status);
        Self {
            device_id: device_id.into(),
            device,
            formatted_status,
            labels,
        }
    }
}

pub fn flatten(status: &[StatusEntry]) -> Map<String, Value> {
    status
        .iter()
        .map(|entry| (entry.code.clone(), entry.value.clone()))
        .collect()
}

impl StatusLabels {
    pub fn from_status(status: &Map<String, Value>) -> Self {
        let bool_of = |code: &str| status.get(code).and_then(Value::as_bool);
        let str_of = |code: &str| status.get(code).and_then(Value::as_str);

        let battery_percentage = status
            .get(StatusCode::BatteryPercentage.as_str())
            .and_then(Value::as_i64);
        let reported_band = parsed::<BatteryBand>(str_of(StatusCode::BatteryState.as_str()));
        let battery_state = battery_percentage
            .and_then(BatteryBand::from_percentage)
            .or(reported_band);

        let charging = status
            .get(StatusCode::ChargeState.as_str())
            .and_then(|v| v.as_bool().or_else(|| v.as_str().map(|s| s == "charging")));

        Self {
            armed: bool_of(CommandCode::AlertState.as_str()),
            alarm_active: bool_of(CommandCode::AlarmSwitch.as_str()),
            master_mode: parsed(str_of(CommandCode::MasterMode.as_str())),
            alarm_state: parsed(str_of(CommandCode::AlarmState.as_str())),
            volume: parsed(str_of(CommandCode::AlarmVolume.as_str())),
            brightness: parsed(str_of(CommandCode::BrightState.as_str())),
            alarm_duration_secs: status
                .get(CommandCode::AlarmTime.as_str())
                .and_then(Value::as_u64)
                .and_then(|secs| u8::try_from(secs).ok()),
            battery_percentage,
            battery_state,
            charging,
            tamper_alarm: bool_of(StatusCode::TemperAlarm.as_str()),
        }
    }
}

fn parsed<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.parse().ok())
}
