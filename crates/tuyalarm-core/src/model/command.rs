// ── Writable data points and their value domains ──
//
// The single source of truth for which command codes exist and which
// values each accepts. Every outbound command is built from a `Command`,
// so an out-of-domain value can never reach the platform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tuyalarm_api::CommandPayload;

use crate::error::CoreError;
use crate::model::status::StatusCode;

/// Writable data-point codes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CommandCode {
    AlarmSwitch,
    AlertState,
    AlarmState,
    AlarmVolume,
    BrightState,
    MasterMode,
    AlarmTime,
}

/// What a command code accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDomain {
    Bool,
    OneOf(&'static [&'static str]),
    Range { min: i64, max: i64 },
}

impl fmt::Display for ValueDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("true or false"),
            Self::OneOf(values) => write!(f, "one of: {}", values.join(", ")),
            Self::Range { min, max } => write!(f, "an integer from {min} to {max}"),
        }
    }
}

impl CommandCode {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn domain(self) -> ValueDomain {
        match self {
            Self::AlarmSwitch | Self::AlertState => ValueDomain::Bool,
            Self::AlarmState => ValueDomain::OneOf(AlarmState::VARIANTS),
            Self::AlarmVolume => ValueDomain::OneOf(VolumeLevel::VARIANTS),
            Self::BrightState => ValueDomain::OneOf(BrightnessLevel::VARIANTS),
            Self::MasterMode => ValueDomain::OneOf(MasterMode::VARIANTS),
            Self::AlarmTime => ValueDomain::Range {
                min: i64::from(AlarmDuration::MIN),
                max: i64::from(AlarmDuration::MAX),
            },
        }
    }
}

// ── Value enums ──────────────────────────────────────────────────────

/// Declares a string-valued data-point enum with strum + serde in lockstep.
macro_rules! value_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
            Display, EnumString, EnumIter, IntoStaticStr, VariantNames,
        )]
        #[serde(rename_all = "snake_case")]
        #[strum(serialize_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                self.into()
            }
        }
    };
}

value_enum! {
    /// `alarm_state`: which outputs fire when the alarm triggers.
    AlarmState { Normal, AlarmSound, AlarmLight, AlarmSoundLight }
}

value_enum! {
    /// `alarm_volume`
    VolumeLevel { Mute, Low, Middle, High }
}

value_enum! {
    /// `bright_state`
    BrightnessLevel { Low, Middle, High, Strong }
}

value_enum! {
    /// `master_mode`
    MasterMode { Disarmed, Arm, Home, Sos, Work, Play }
}

/// `alarm_time` in seconds, always within `1..=60`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AlarmDuration(u8);

impl AlarmDuration {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 60;

    pub fn new(seconds: i64) -> Result<Self, CoreError> {
        u8::try_from(seconds)
            .ok()
            .filter(|s| (Self::MIN..=Self::MAX).contains(s))
            .map(Self)
            .ok_or_else(|| {
                CoreError::validation(format!(
                    "alarm duration must be between {} and {} seconds, got {seconds}",
                    Self::MIN,
                    Self::MAX
                ))
            })
    }

    /// Clamp into range.
    pub const fn saturating(seconds: u8) -> Self {
        if seconds < Self::MIN {
            Self(Self::MIN)
        } else if seconds > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(seconds)
        }
    }

    pub fn seconds(self) -> u8 {
        self.0
    }
}

// ── Command ──────────────────────────────────────────────────────────

/// A validated `{code, value}` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AlarmSwitch(bool),
    AlertState(bool),
    AlarmState(AlarmState),
    AlarmVolume(VolumeLevel),
    BrightState(BrightnessLevel),
    MasterMode(MasterMode),
    AlarmTime(AlarmDuration),
}

impl Command {
    pub fn code(&self) -> CommandCode {
        match self {
            Self::AlarmSwitch(_) => CommandCode::AlarmSwitch,
            Self::AlertState(_) => CommandCode::AlertState,
            Self::AlarmState(_) => CommandCode::AlarmState,
            Self::AlarmVolume(_) => CommandCode::AlarmVolume,
            Self::BrightState(_) => CommandCode::BrightState,
            Self::MasterMode(_) => CommandCode::MasterMode,
            Self::AlarmTime(_) => CommandCode::AlarmTime,
        }
    }

    pub fn value(&self) -> Value {
        match self {
            Self::AlarmSwitch(on) | Self::AlertState(on) => Value::Bool(*on),
            Self::AlarmState(v) => json!(v.as_str()),
            Self::AlarmVolume(v) => json!(v.as_str()),
            Self::BrightState(v) => json!(v.as_str()),
            Self::MasterMode(v) => json!(v.as_str()),
            Self::AlarmTime(d) => json!(d.seconds()),
        }
    }

    /// Wire form sent in a command batch.
    pub fn to_payload(&self) -> CommandPayload {
        CommandPayload {
            code: self.code().as_str().to_owned(),
            value: self.value(),
        }
    }

    /// Validate an untyped `{code, value}` pair against the domain table.
    pub fn parse(code: &str, value: &Value) -> Result<Self, CoreError> {
        let Ok(code) = CommandCode::from_str(code) else {
            return Err(if StatusCode::from_str(code).is_ok() {
                CoreError::validation(format!("'{code}' is a read-only status code"))
            } else {
                CoreError::validation(format!("unknown command code '{code}'"))
            });
        };

        let out_of_domain = || {
            CoreError::validation(format!(
                "invalid value {value} for '{code}': expected {}",
                code.domain()
            ))
        };

        match code {
            CommandCode::AlarmSwitch => value.as_bool().map(Self::AlarmSwitch).ok_or_else(out_of_domain),
            CommandCode::AlertState => value.as_bool().map(Self::AlertState).ok_or_else(out_of_domain),
            CommandCode::AlarmState => parse_str(value).map(Self::AlarmState).ok_or_else(out_of_domain),
            CommandCode::AlarmVolume => parse_str(value).map(Self::AlarmVolume).ok_or_else(out_of_domain),
            CommandCode::BrightState => parse_str(value).map(Self::BrightState).ok_or_else(out_of_domain),
            CommandCode::MasterMode => parse_str(value).map(Self::MasterMode).ok_or_else(out_of_domain),
            CommandCode::AlarmTime => value
                .as_i64()
                .and_then(|secs| AlarmDuration::new(secs).ok())
                .map(Self::AlarmTime)
                .ok_or_else(out_of_domain),
        }
    }
}

impl TryFrom<&CommandPayload> for Command {
    type Error = CoreError;

    fn try_from(raw: &CommandPayload) -> Result<Self, Self::Error> {
        Self::parse(&raw.code, &raw.value)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.code(), self.value())
    }
}

fn parse_str<T: FromStr>(value: &Value) -> Option<T> {
    value.as_str().and_then(|s| s.parse().ok())
}

/// Parse a level/mode argument, naming the accepted values on failure.
pub(crate) fn parse_level<T>(field: CommandCode, input: &str) -> Result<T, CoreError>
where
    T: FromStr + VariantNames,
{
    input.parse().map_err(|_| {
        CoreError::validation(format!(
            "invalid {field} '{input}': expected one of: {}",
            T::VARIANTS.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use tuyalarm_api::ErrorKind;

    #[test]
    fn parses_every_domain() {
        assert_eq!(
            Command::parse("alarm_switch", &json!(true)).unwrap(),
            Command::AlarmSwitch(true)
        );
        assert_eq!(
            Command::parse("alarm_state", &json!("alarm_sound_light")).unwrap(),
            Command::AlarmState(AlarmState::AlarmSoundLight)
        );
        assert_eq!(
            Command::parse("alarm_volume", &json!("mute")).unwrap(),
            Command::AlarmVolume(VolumeLevel::Mute)
        );
        assert_eq!(
            Command::parse("bright_state", &json!("strong")).unwrap(),
            Command::BrightState(BrightnessLevel::Strong)
        );
        assert_eq!(
            Command::parse("master_mode", &json!("sos")).unwrap(),
            Command::MasterMode(MasterMode::Sos)
        );
        assert_eq!(
            Command::parse("alarm_time", &json!(60)).unwrap().value(),
            json!(60)
        );
    }

    #[test]
    fn rejects_out_of_domain_values() {
        let bad = [
            ("alarm_volume", json!("extreme")),
            ("alarm_volume", json!(3)),
            ("alarm_switch", json!("true")),
            ("bright_state", json!("mute")),
            ("master_mode", json!("Arm")),
            ("alarm_time", json!(0)),
            ("alarm_time", json!(61)),
            ("alarm_time", json!(-5)),
            ("alarm_time", json!(2.5)),
        ];
        for (code, value) in bad {
            let err = Command::parse(code, &value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{code}={value}");
        }
    }

    #[test]
    fn unknown_and_read_only_codes_are_rejected() {
        let unknown = Command::parse("self_destruct", &json!(true)).unwrap_err();
        assert!(unknown.to_string().contains("unknown command code"));

        let read_only = Command::parse("battery_percentage", &json!(50)).unwrap_err();
        assert!(read_only.to_string().contains("read-only"));
    }

    #[test]
    fn error_lists_accepted_values() {
        let err = Command::parse("alarm_volume", &json!("extreme")).unwrap_err();
        assert!(err.to_string().contains("mute, low, middle, high"));
    }

    #[test]
    fn payload_uses_wire_names() {
        let payload = Command::AlarmState(AlarmState::AlarmLight).to_payload();
        assert_eq!(payload.code, "alarm_state");
        assert_eq!(payload.value, json!("alarm_light"));
    }

    #[test]
    fn duration_bounds() {
        assert!(AlarmDuration::new(1).is_ok());
        assert!(AlarmDuration::new(60).is_ok());
        assert!(AlarmDuration::new(0).is_err());
        assert!(AlarmDuration::new(61).is_err());
        assert!(AlarmDuration::new(300).is_err());
        assert_eq!(AlarmDuration::saturating(0).seconds(), 1);
        assert_eq!(AlarmDuration::saturating(90).seconds(), 60);
    }

    #[test]
    fn level_parse_names_field() {
        let err = parse_level::<BrightnessLevel>(CommandCode::BrightState, "blinding").unwrap_err();
        assert!(err.to_string().contains("bright_state"));
        assert!(err.to_string().contains("low, middle, high, strong"));
    }
}
