// tuyalarm-core: Alarm command model and device operations on top of tuyalarm-api.

pub mod config;
pub mod error;
pub mod model;
pub mod operations;
pub mod result;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::AlarmConfig;
pub use error::CoreError;
pub use operations::{CredentialCheck, DeviceOperations, validate_device_id};
pub use result::{ApiFailure, ApiResult};

pub use model::{
    AlarmDuration, AlarmState, BatteryBand, BrightnessLevel, Bundle, Command, CommandCode,
    DeviceStatus, MasterMode, Preset, PresetInfo, StatusCode, StatusLabels, ValueDomain,
    VolumeLevel,
};

pub use tuyalarm_api::{AUTH_CODES, CommandPayload, ErrorKind};
