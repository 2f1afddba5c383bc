// ── Named command sequences ──
//
// Presets are user-selectable modes; bundles back the dedicated alarm
// operations. Both expand into a fixed, ordered command list.

use std::str::FromStr;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr, VariantNames};
use tuyalarm_api::CommandPayload;

use crate::error::CoreError;
use crate::model::command::{
    AlarmDuration, AlarmState, BrightnessLevel, Command, MasterMode, VolumeLevel,
};

/// User-selectable presets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr, VariantNames,
)]
#[strum(serialize_all = "snake_case")]
pub enum Preset {
    Home,
    Away,
    Night,
    Silent,
    Test,
}

impl Preset {
    /// Look up a preset by name.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        Self::from_str(name).map_err(|_| {
            CoreError::validation(format!(
                "unknown preset '{name}': expected one of: {}",
                Self::VARIANTS.join(", ")
            ))
        })
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Home => "Occupied: armed for home, moderate siren and strobe",
            Self::Away => "Fully armed with loud siren and strong strobe",
            Self::Night => "Armed for home with a quiet siren and dim strobe",
            Self::Silent => "Strobe only, siren muted",
            Self::Test => "Short, quiet siren burst to check the device",
        }
    }

    pub fn commands(self) -> Vec<Command> {
        match self {
            Self::Home => vec![
                Command::MasterMode(MasterMode::Home),
                Command::AlertState(true),
                Command::AlarmVolume(VolumeLevel::Middle),
                Command::BrightState(BrightnessLevel::Middle),
            ],
            Self::Away => vec![
                Command::MasterMode(MasterMode::Arm),
                Command::AlertState(true),
                Command::AlarmSwitch(true),
                Command::AlarmVolume(VolumeLevel::High),
                Command::BrightState(BrightnessLevel::Strong),
            ],
            Self::Night => vec![
                Command::MasterMode(MasterMode::Home),
                Command::AlarmVolume(VolumeLevel::Low),
                Command::BrightState(BrightnessLevel::Low),
            ],
            Self::Silent => vec![
                Command::AlarmVolume(VolumeLevel::Mute),
                Command::AlarmState(AlarmState::AlarmLight),
                Command::BrightState(BrightnessLevel::Middle),
            ],
            Self::Test => vec![
                Command::AlarmState(AlarmState::AlarmSound),
                Command::AlarmVolume(VolumeLevel::Low),
                Command::AlarmTime(AlarmDuration::saturating(5)),
            ],
        }
    }
}

/// Fixed sequences behind the activate / deactivate / time-to-work operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Bundle {
    Emergency,
    Deactivate,
    TimeToWork,
}

impl Bundle {
    pub fn commands(self) -> Vec<Command> {
        match self {
            Self::Emergency => vec![
                Command::AlarmSwitch(true),
                Command::AlertState(true),
                Command::AlarmState(AlarmState::AlarmSoundLight),
                Command::AlarmVolume(VolumeLevel::High),
                Command::BrightState(BrightnessLevel::Strong),
                Command::MasterMode(MasterMode::Sos),
            ],
            Self::Deactivate => vec![
                Command::AlarmSwitch(false),
                Command::AlertState(false),
                Command::AlarmState(AlarmState::Normal),
                Command::MasterMode(MasterMode::Disarmed),
            ],
            Self::TimeToWork => vec![
                Command::AlarmSwitch(true),
                Command::AlertState(true),
                Command::AlarmState(AlarmState::AlarmSoundLight),
                Command::AlarmVolume(VolumeLevel::Middle),
                Command::AlarmTime(AlarmDuration::saturating(3)),
                Command::BrightState(BrightnessLevel::Strong),
                Command::MasterMode(MasterMode::Sos),
            ],
        }
    }
}

/// Commands sent by `set_mode`: the mode itself plus the arming flags
/// that go with it.
pub fn mode_commands(mode: MasterMode) -> Vec<Command> {
    let mut commands = vec![Command::MasterMode(mode)];
    match mode {
        MasterMode::Arm => {
            commands.push(Command::AlertState(true));
            commands.push(Command::AlarmSwitch(true));
        }
        MasterMode::Disarmed => commands.push(Command::AlertState(false)),
        MasterMode::Home | MasterMode::Sos | MasterMode::Work | MasterMode::Play => {}
    }
    commands
}

/// Serialisable description of a preset for listings.
#[derive(Debug, Clone, Serialize)]
pub struct PresetInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub commands: Vec<CommandPayload>,
}

impl From<Preset> for PresetInfo {
    fn from(preset: Preset) -> Self {
        Self {
            name: preset.as_str(),
            description: preset.description(),
            commands: preset.commands().iter().map(Command::to_payload).collect(),
        }
    }
}

/// Every preset, in declaration order.
pub fn all_presets() -> Vec<PresetInfo> {
    Preset::iter().map(PresetInfo::from).collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn wire(commands: &[Command]) -> Vec<(String, serde_json::Value)> {
        commands
            .iter()
            .map(|c| {
                let p = c.to_payload();
                (p.code, p.value)
            })
            .collect()
    }

    #[test]
    fn away_sequence_is_exact() {
        assert_eq!(
            wire(&Preset::Away.commands()),
            vec![
                ("master_mode".into(), json!("arm")),
                ("alert_state".into(), json!(true)),
                ("alarm_switch".into(), json!(true)),
                ("alarm_volume".into(), json!("high")),
                ("bright_state".into(), json!("strong")),
            ]
        );
    }

    #[test]
    fn test_preset_carries_duration() {
        assert_eq!(
            wire(&Preset::Test.commands()).last().unwrap(),
            &("alarm_time".to_owned(), json!(5))
        );
    }

    #[test]
    fn time_to_work_duration() {
        let cmds = wire(&Bundle::TimeToWork.commands());
        assert!(cmds.contains(&("alarm_time".to_owned(), json!(3))));
        assert_eq!(cmds.len(), 7);
    }

    #[test]
    fn preset_lookup() {
        assert_eq!(Preset::parse("night").unwrap(), Preset::Night);
        let err = Preset::parse("nonexistent").unwrap_err();
        assert!(err.to_string().contains("home, away, night, silent, test"));
    }

    #[test]
    fn mode_flags() {
        assert_eq!(
            mode_commands(MasterMode::Arm),
            vec![
                Command::MasterMode(MasterMode::Arm),
                Command::AlertState(true),
                Command::AlarmSwitch(true),
            ]
        );
        assert_eq!(
            mode_commands(MasterMode::Disarmed),
            vec![
                Command::MasterMode(MasterMode::Disarmed),
                Command::AlertState(false),
            ]
        );
        assert_eq!(
            mode_commands(MasterMode::Work),
            vec![Command::MasterMode(MasterMode::Work)]
        );
    }

    #[test]
    fn listing_covers_every_preset() {
        let names: Vec<_> = all_presets().iter().map(|p| p.name).collect();
        assert_eq!(names, ["home", "away", "night", "silent", "test"]);
    }
}
