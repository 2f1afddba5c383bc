// ── Domain model ──

pub mod command;
pub mod preset;
pub mod status;

pub use command::{
    AlarmDuration, AlarmState, BrightnessLevel, Command, CommandCode, MasterMode, ValueDomain,
    VolumeLevel,
};
pub use preset::{Bundle, Preset, PresetInfo, all_presets, mode_commands};
pub use status::{BatteryBand, DeviceStatus, StatusCode, StatusLabels};
