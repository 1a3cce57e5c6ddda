// pensettings/src/settings/setting.rs
// Static table of every exposed setting and how it maps onto storage.

use serde::Serialize;
use std::{fmt, str::FromStr};

use super::SettingsError;
use crate::registry::{PathGroup, PEN_VISUALIZATION_ON};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Setting {
    PressureSensitivity,
    LatencyMode,
    DoubleTapWidth,
    DoubleTapHeight,
    DoubleTapTime,
    IgnoreTouchInputWhenUsingPen,
    DblDist,
    DblTime,
    EraseEnable,
    FlickMode,
    FlickTolerance,
    HoldMode,
    HoldTime,
    RightMaskEnable,
    Splash,
    TapTime,
    PenVisualization,
    HidePenCursor,
    TouchPredictionLatency,
    TouchPredictionSampleTime,
    RightClickZoneWidth,
    RightClickZoneHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SettingKind {
    Int,
    Bool,
}

/// How the in-memory value maps to the stored DWORD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Int,
    /// `true` is stored as `on`, `false` as `off`; a stored value reads as
    /// `true` only when it equals `on`.
    Flag { on: i32, off: i32 },
}

const BINARY_FLAG: Encoding = Encoding::Flag { on: 1, off: 0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Int(i32),
    Bool(bool),
}

impl SettingValue {
    #[cfg(test)]
    pub fn as_int(self) -> Option<i32> {
        match self {
            SettingValue::Int(v) => Some(v),
            SettingValue::Bool(_) => None,
        }
    }

    #[cfg(test)]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            SettingValue::Bool(v) => Some(v),
            SettingValue::Int(_) => None,
        }
    }
}

impl From<i32> for SettingValue {
    fn from(v: i32) -> Self {
        SettingValue::Int(v)
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Int(v) => write!(f, "{v}"),
            SettingValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn parse_int(value: &str) -> Option<i32> {
    let v = value.trim();
    match v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        Some(hex) => i32::from_str_radix(hex, 16).ok(),
        None => v.parse().ok(),
    }
}

impl Setting {
    pub const COUNT: usize = 22;

    /// Declaration order; also the order of load notifications.
    pub const ALL: [Setting; Setting::COUNT] = [
        Setting::PressureSensitivity,
        Setting::LatencyMode,
        Setting::DoubleTapWidth,
        Setting::DoubleTapHeight,
        Setting::DoubleTapTime,
        Setting::IgnoreTouchInputWhenUsingPen,
        Setting::DblDist,
        Setting::DblTime,
        Setting::EraseEnable,
        Setting::FlickMode,
        Setting::FlickTolerance,
        Setting::HoldMode,
        Setting::HoldTime,
        Setting::RightMaskEnable,
        Setting::Splash,
        Setting::TapTime,
        Setting::PenVisualization,
        Setting::HidePenCursor,
        Setting::TouchPredictionLatency,
        Setting::TouchPredictionSampleTime,
        Setting::RightClickZoneWidth,
        Setting::RightClickZoneHeight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Setting::PressureSensitivity => "PressureSensitivity",
            Setting::LatencyMode => "LatencyMode",
            Setting::DoubleTapWidth => "DoubleTapWidth",
            Setting::DoubleTapHeight => "DoubleTapHeight",
            Setting::DoubleTapTime => "DoubleTapTime",
            Setting::IgnoreTouchInputWhenUsingPen => "IgnoreTouchInputWhenUsingPen",
            Setting::DblDist => "DblDist",
            Setting::DblTime => "DblTime",
            Setting::EraseEnable => "EraseEnable",
            Setting::FlickMode => "FlickMode",
            Setting::FlickTolerance => "FlickTolerance",
            Setting::HoldMode => "HoldMode",
            Setting::HoldTime => "HoldTime",
            Setting::RightMaskEnable => "RightMaskEnable",
            Setting::Splash => "Splash",
            Setting::TapTime => "TapTime",
            Setting::PenVisualization => "PenVisualization",
            Setting::HidePenCursor => "HidePenCursor",
            Setting::TouchPredictionLatency => "TouchPredictionLatency",
            Setting::TouchPredictionSampleTime => "TouchPredictionSampleTime",
            Setting::RightClickZoneWidth => "RightClickZoneWidth",
            Setting::RightClickZoneHeight => "RightClickZoneHeight",
        }
    }

    pub fn group(self) -> PathGroup {
        use Setting::*;
        match self {
            PressureSensitivity | LatencyMode | DoubleTapWidth | DoubleTapHeight | DoubleTapTime => PathGroup::Pen,
            IgnoreTouchInputWhenUsingPen => PathGroup::NtPen,
            DblDist | DblTime | EraseEnable | FlickMode | FlickTolerance | HoldMode | HoldTime
            | RightMaskEnable | Splash | TapTime => PathGroup::SysEventParameters,
            PenVisualization | HidePenCursor => PathGroup::PenVisualization,
            TouchPredictionLatency | TouchPredictionSampleTime => PathGroup::TouchPrediction,
            RightClickZoneWidth | RightClickZoneHeight => PathGroup::TouchPad,
        }
    }

    /// Name of the registry value backing this setting.
    pub fn value_name(self) -> &'static str {
        match self {
            Setting::IgnoreTouchInputWhenUsingPen => "PenArbitrationType",
            Setting::HidePenCursor => "PenVisualization",
            Setting::TouchPredictionLatency => "Latency",
            Setting::TouchPredictionSampleTime => "SampleTime",
            other => other.name(),
        }
    }

    pub fn encoding(self) -> Encoding {
        match self {
            Setting::IgnoreTouchInputWhenUsingPen
            | Setting::EraseEnable
            | Setting::FlickMode
            | Setting::RightMaskEnable => BINARY_FLAG,
            // press and hold is disabled with 3, not 0
            Setting::HoldMode => Encoding::Flag { on: 1, off: 3 },
            Setting::HidePenCursor => Encoding::Flag { on: 0, off: PEN_VISUALIZATION_ON },
            _ => Encoding::Int,
        }
    }

    pub fn kind(self) -> SettingKind {
        match self.encoding() {
            Encoding::Int => SettingKind::Int,
            Encoding::Flag { .. } => SettingKind::Bool,
        }
    }

    /// Stored value used when the registry holds nothing for this setting,
    /// taken from the group's reset table.
    pub fn default_stored(self) -> i32 {
        self.group().default_for(self.value_name()).unwrap_or(0)
    }

    pub fn default_value(self) -> SettingValue {
        self.decode(self.default_stored())
    }

    pub fn decode(self, stored: i32) -> SettingValue {
        match self.encoding() {
            Encoding::Int => SettingValue::Int(stored),
            Encoding::Flag { on, .. } => SettingValue::Bool(stored == on),
        }
    }

    /// Stored form of `value`, `None` when the kind does not match.
    pub fn encode(self, value: SettingValue) -> Option<i32> {
        match (self.encoding(), value) {
            (Encoding::Int, SettingValue::Int(v)) => Some(v),
            (Encoding::Flag { on, off }, SettingValue::Bool(b)) => Some(if b { on } else { off }),
            _ => None,
        }
    }

    /// The other setting backed by the same registry value, if any.
    pub fn partner(self) -> Option<Setting> {
        Setting::ALL
            .into_iter()
            .find(|s| *s != self && s.group() == self.group() && s.value_name() == self.value_name())
    }

    /// Coerce user input to this setting's kind.
    pub fn parse_value(self, input: &str) -> Result<SettingValue, SettingsError> {
        let parsed = match self.kind() {
            SettingKind::Int => parse_int(input).map(SettingValue::Int),
            SettingKind::Bool => parse_flag(input).map(SettingValue::Bool),
        };
        parsed.ok_or_else(|| SettingsError::InvalidValue {
            setting: self,
            input: input.to_string(),
        })
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Accepts `HoldMode`, `holdmode`, `hold-mode` and `hold_mode`.
impl FromStr for Setting {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Setting::ALL
            .into_iter()
            .find(|setting| normalize(setting.name()) == wanted)
            .ok_or_else(|| SettingsError::UnknownSetting(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_in_declaration_order() {
        for (i, setting) in Setting::ALL.into_iter().enumerate() {
            assert_eq!(setting.index(), i);
        }
    }

    #[test]
    fn every_setting_has_a_reset_default() {
        for setting in Setting::ALL {
            assert!(setting.group().default_for(setting.value_name()).is_some(), "{setting}");
        }
        assert_eq!(Setting::HoldTime.default_stored(), 2300);
        assert_eq!(Setting::HidePenCursor.default_stored(), PEN_VISUALIZATION_ON);
        assert_eq!(Setting::TouchPredictionSampleTime.default_stored(), 8);
    }

    #[test]
    fn every_group_value_is_exposed() {
        for group in PathGroup::ALL {
            for (name, _) in group.defaults() {
                assert!(
                    Setting::ALL.iter().any(|s| s.group() == group && s.value_name() == *name),
                    "{group} {name}"
                );
            }
        }
    }

    #[test]
    fn hold_mode_uses_one_and_three() {
        let s = Setting::HoldMode;
        assert_eq!(s.encode(true.into()), Some(1));
        assert_eq!(s.encode(false.into()), Some(3));
        assert_eq!(s.decode(1), SettingValue::Bool(true));
        assert_eq!(s.decode(3), SettingValue::Bool(false));
        assert_eq!(s.decode(0), SettingValue::Bool(false));
    }

    #[test]
    fn hide_pen_cursor_is_inverse_view() {
        let s = Setting::HidePenCursor;
        assert_eq!(s.decode(0), SettingValue::Bool(true));
        assert_eq!(s.decode(0x23), SettingValue::Bool(false));
        assert_eq!(s.decode(5), SettingValue::Bool(false));
        assert_eq!(s.encode(true.into()), Some(0));
        assert_eq!(s.encode(false.into()), Some(0x23));
        assert_eq!(s.default_value(), SettingValue::Bool(false));
    }

    #[test]
    fn only_pen_visualization_pair_shares_storage() {
        assert_eq!(Setting::PenVisualization.partner(), Some(Setting::HidePenCursor));
        assert_eq!(Setting::HidePenCursor.partner(), Some(Setting::PenVisualization));
        let shared = Setting::ALL.iter().filter(|s| s.partner().is_some()).count();
        assert_eq!(shared, 2);
    }

    #[test]
    fn encode_rejects_wrong_kind() {
        assert_eq!(Setting::Splash.encode(true.into()), None);
        assert_eq!(Setting::FlickMode.encode(1.into()), None);
    }

    #[test]
    fn parses_names_in_several_spellings() {
        assert_eq!("HoldMode".parse::<Setting>().unwrap(), Setting::HoldMode);
        assert_eq!("hold-mode".parse::<Setting>().unwrap(), Setting::HoldMode);
        assert_eq!(
            "ignore_touch_input_when_using_pen".parse::<Setting>().unwrap(),
            Setting::IgnoreTouchInputWhenUsingPen
        );
        assert!(matches!(
            "PenColor".parse::<Setting>(),
            Err(SettingsError::UnknownSetting(_))
        ));
    }

    #[test]
    fn parses_values_by_kind() {
        assert_eq!(Setting::PenVisualization.parse_value("0x23").unwrap(), SettingValue::Int(0x23));
        assert_eq!(Setting::HoldTime.parse_value(" 1500 ").unwrap(), SettingValue::Int(1500));
        assert_eq!(Setting::FlickMode.parse_value("off").unwrap(), SettingValue::Bool(false));
        assert_eq!(Setting::EraseEnable.parse_value("1").unwrap(), SettingValue::Bool(true));
        assert!(Setting::Splash.parse_value("lots").is_err());
        assert!(Setting::HoldMode.parse_value("3").is_err());
    }
}
