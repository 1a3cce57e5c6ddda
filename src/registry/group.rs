// pensettings/src/registry/group.rs
// The six registry locations holding pen and touch settings.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Hive {
    CurrentUser,
    LocalMachine,
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Hive::CurrentUser => "HKCU",
            Hive::LocalMachine => "HKLM",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PathGroup {
    Pen,
    NtPen,
    SysEventParameters,
    PenVisualization,
    TouchPrediction,
    TouchPad,
}

const PEN_DEFAULTS: &[(&str, i32)] = &[
    ("PressureSensitivity", 5),
    ("LatencyMode", 1),
    ("DoubleTapWidth", 10),
    ("DoubleTapHeight", 10),
    ("DoubleTapTime", 500),
];

// 1 ignores touch input while the pen is in range
const NT_PEN_DEFAULTS: &[(&str, i32)] = &[("PenArbitrationType", 0)];

const SYS_EVENT_DEFAULTS: &[(&str, i32)] = &[
    ("DblDist", 20),
    ("DblTime", 300),
    ("EraseEnable", 1),
    ("FlickMode", 1),
    ("FlickTolerance", 50),
    ("HoldMode", 1),
    ("HoldTime", 2300),
    ("RightMaskEnable", 1),
    ("Splash", 50),
    ("TapTime", 100),
];

const PEN_VISUALIZATION_DEFAULTS: &[(&str, i32)] = &[("PenVisualization", PEN_VISUALIZATION_ON)];

const TOUCH_PREDICTION_DEFAULTS: &[(&str, i32)] = &[("Latency", 8), ("SampleTime", 8)];

const TOUCH_PAD_DEFAULTS: &[(&str, i32)] = &[
    ("RightClickZoneWidth", 50),
    ("RightClickZoneHeight", 25),
];

/// Stored PenVisualization value with every visual feedback enabled.
pub const PEN_VISUALIZATION_ON: i32 = 0x0023;

impl PathGroup {
    /// Reset and enumeration order.
    pub const ALL: [PathGroup; 6] = [
        PathGroup::Pen,
        PathGroup::NtPen,
        PathGroup::SysEventParameters,
        PathGroup::PenVisualization,
        PathGroup::TouchPrediction,
        PathGroup::TouchPad,
    ];

    pub fn hive(self) -> Hive {
        match self {
            PathGroup::TouchPrediction => Hive::LocalMachine,
            _ => Hive::CurrentUser,
        }
    }

    pub fn subkey(self) -> &'static str {
        match self {
            PathGroup::Pen => r"SOFTWARE\Microsoft\Wisp\Pen",
            PathGroup::NtPen => r"SOFTWARE\Microsoft\Windows NT\CurrentVersion\Windows\Pen",
            PathGroup::SysEventParameters => r"SOFTWARE\Microsoft\Wisp\Pen\SysEventParameters",
            PathGroup::PenVisualization => r"Control Panel\Cursors",
            PathGroup::TouchPrediction => r"SOFTWARE\Microsoft\TouchPrediction",
            PathGroup::TouchPad => r"SOFTWARE\Microsoft\Windows\CurrentVersion\PrecisionTouchPad",
        }
    }

    /// Prefix used for this group's names in the flat enumeration map.
    pub fn tag(self) -> &'static str {
        match self {
            PathGroup::Pen => "",
            PathGroup::NtPen => "NT_",
            PathGroup::SysEventParameters => "SysEvent_",
            PathGroup::PenVisualization => "Viz_",
            PathGroup::TouchPrediction => "TouchPred_",
            PathGroup::TouchPad => "TouchPad_",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PathGroup::Pen => "pen",
            PathGroup::NtPen => "pen arbitration",
            PathGroup::SysEventParameters => "gesture parameters",
            PathGroup::PenVisualization => "cursor visualization",
            PathGroup::TouchPrediction => "touch prediction",
            PathGroup::TouchPad => "precision touchpad",
        }
    }

    pub fn defaults(self) -> &'static [(&'static str, i32)] {
        match self {
            PathGroup::Pen => PEN_DEFAULTS,
            PathGroup::NtPen => NT_PEN_DEFAULTS,
            PathGroup::SysEventParameters => SYS_EVENT_DEFAULTS,
            PathGroup::PenVisualization => PEN_VISUALIZATION_DEFAULTS,
            PathGroup::TouchPrediction => TOUCH_PREDICTION_DEFAULTS,
            PathGroup::TouchPad => TOUCH_PAD_DEFAULTS,
        }
    }

    pub fn default_for(self, name: &str) -> Option<i32> {
        self.defaults()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Writes to this group need an elevated process.
    pub fn is_privileged(self) -> bool {
        self.hive() == Hive::LocalMachine
    }

    /// Whether a stored value belongs in the enumeration. The cursor and
    /// touchpad keys are shared with unrelated system settings.
    pub fn enumerates(self, name: &str) -> bool {
        match self {
            PathGroup::PenVisualization => name == "PenVisualization",
            PathGroup::TouchPad => name.starts_with("RightClickZone"),
            _ => true,
        }
    }

    pub fn display_path(self) -> String {
        format!(r"{}\{}", self.hive(), self.subkey())
    }
}

impl fmt::Display for PathGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn only_touch_prediction_is_machine_wide() {
        let privileged: Vec<_> = PathGroup::ALL.iter().filter(|g| g.is_privileged()).collect();
        assert_eq!(privileged, vec![&PathGroup::TouchPrediction]);
        assert_eq!(
            PathGroup::TouchPrediction.display_path(),
            r"HKLM\SOFTWARE\Microsoft\TouchPrediction"
        );
    }

    #[test]
    fn tags_keep_enumeration_keys_unique() {
        let tags: HashSet<_> = PathGroup::ALL.iter().map(|g| g.tag()).collect();
        assert_eq!(tags.len(), PathGroup::ALL.len());
    }

    #[test]
    fn shared_keys_filter_foreign_values() {
        assert!(PathGroup::PenVisualization.enumerates("PenVisualization"));
        assert!(!PathGroup::PenVisualization.enumerates("Arrow"));
        assert!(PathGroup::TouchPad.enumerates("RightClickZoneHeight"));
        assert!(!PathGroup::TouchPad.enumerates("AAPThreshold"));
        assert!(PathGroup::Pen.enumerates("Anything"));
    }

    #[test]
    fn default_lookup() {
        assert_eq!(PathGroup::SysEventParameters.default_for("HoldTime"), Some(2300));
        assert_eq!(PathGroup::PenVisualization.default_for("PenVisualization"), Some(0x23));
        assert_eq!(PathGroup::Pen.default_for("HoldTime"), None);
    }
}
