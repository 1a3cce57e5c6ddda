// pensettings/src/registry/mod.rs
// Registry access layer: per-group reads, writes, resets and enumeration.

pub mod error;
pub mod group;
#[cfg(any(test, not(windows)))]
pub mod memory;
pub mod store;
#[cfg(windows)]
pub mod win32;

use std::collections::BTreeMap;

pub use error::{RegistryError, ADMIN_RIGHTS_REQUIRED};
pub use group::{PathGroup, PEN_VISUALIZATION_ON};
#[cfg(any(test, not(windows)))]
pub use memory::MemoryRegistry;
pub use store::{RegValue, RegistryStore};
#[cfg(windows)]
pub use win32::WindowsRegistry;

use crate::{info, warn, error};

/// How one group fared during a bulk reset.
#[derive(Debug)]
pub enum ResetOutcome {
    Succeeded,
    /// The privileged group could not be written; left unchanged.
    Denied(RegistryError),
    Failed(RegistryError),
}

#[derive(Debug, Default)]
pub struct ResetReport {
    outcomes: Vec<(PathGroup, ResetOutcome)>,
}

impl ResetReport {
    pub fn outcomes(&self) -> &[(PathGroup, ResetOutcome)] {
        &self.outcomes
    }

    #[cfg(test)]
    pub fn outcome(&self, group: PathGroup) -> Option<&ResetOutcome> {
        self.outcomes.iter().find(|(g, _)| *g == group).map(|(_, o)| o)
    }

    pub fn denied_groups(&self) -> Vec<PathGroup> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ResetOutcome::Denied(_)))
            .map(|(g, _)| *g)
            .collect()
    }

    /// Every group was rewritten.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| matches!(o, ResetOutcome::Succeeded))
    }

    /// Turn the first unexpected failure into an error. Denied groups are not errors.
    pub fn into_result(self) -> Result<ResetReport, RegistryError> {
        let mut report = ResetReport::default();
        let mut first_failure = None;
        for (group, outcome) in self.outcomes {
            match outcome {
                ResetOutcome::Failed(e) if first_failure.is_none() => first_failure = Some(e),
                other => report.outcomes.push((group, other)),
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}

pub struct RegistryAccess<S> {
    store: S,
}

impl<S: RegistryStore> RegistryAccess<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read a value of `group`, falling back to `default` when the key or the
    /// value is absent.
    pub fn read(&self, group: PathGroup, name: &str, default: i32) -> Result<i32, RegistryError> {
        match self.store.read_value(group.hive(), group.subkey(), name)? {
            Some(value) => value.as_i32().ok_or_else(|| RegistryError::UnexpectedType {
                path: group.display_path(),
                name: name.to_string(),
                kind: value.kind_name(),
            }),
            None => {
                info!("[Registry] '{}' not set in {}, using default {}", name, group.display_path(), default);
                Ok(default)
            }
        }
    }

    /// Store `value` under the registry type it carries.
    pub fn write(&self, group: PathGroup, name: &str, value: RegValue) -> Result<(), RegistryError> {
        self.store
            .write_value(group.hive(), group.subkey(), name, &value)
            .map_err(|e| {
                if group.is_privileged() {
                    e.with_denied_message(ADMIN_RIGHTS_REQUIRED)
                } else {
                    e
                }
            })?;
        info!("[Registry] {} {}={}", group.display_path(), name, value);
        Ok(())
    }

    /// Overwrite every entry of the group's default table.
    pub fn reset(&self, group: PathGroup) -> Result<(), RegistryError> {
        for (name, value) in group.defaults() {
            self.write(group, name, RegValue::DWord(*value as u32))?;
        }
        Ok(())
    }

    /// Reset all six groups in order. A group's failure never stops the others.
    pub fn reset_all(&self) -> ResetReport {
        let mut report = ResetReport::default();
        for group in PathGroup::ALL {
            let outcome = match self.reset(group) {
                Ok(()) => {
                    info!("[Registry] Reset {} to defaults", group);
                    ResetOutcome::Succeeded
                }
                Err(e) if e.is_access_denied() && group.is_privileged() => {
                    warn!("[Registry] Skipped resetting {}: {}", group, e);
                    ResetOutcome::Denied(e)
                }
                Err(e) => {
                    error!("[Registry] Failed to reset {}: {}", group, e);
                    ResetOutcome::Failed(e)
                }
            };
            report.outcomes.push((group, outcome));
        }
        report
    }

    /// Every stored value of every group, keyed `<group tag><value name>`.
    /// The privileged group is left out when it cannot be opened.
    pub fn enumerate(&self) -> Result<BTreeMap<String, RegValue>, RegistryError> {
        let mut all = BTreeMap::new();
        for group in PathGroup::ALL {
            let values = match self.store.values(group.hive(), group.subkey()) {
                Ok(values) => values,
                Err(e) if e.is_access_denied() && group.is_privileged() => {
                    warn!("[Registry] Skipping {} in enumeration: {}", group, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            for (name, value) in values.into_iter().flatten() {
                if group.enumerates(&name) {
                    all.insert(format!("{}{}", group.tag(), name), value);
                }
            }
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use group::Hive;

    fn hklm_denied() -> MemoryRegistry {
        let store = MemoryRegistry::new();
        let tp = PathGroup::TouchPrediction;
        store.deny_write(tp.hive(), tp.subkey());
        store.deny_read(tp.hive(), tp.subkey());
        store
    }

    #[test]
    fn read_falls_back_without_creating_key() {
        let store = MemoryRegistry::new();
        let access = RegistryAccess::new(&store);
        let g = PathGroup::SysEventParameters;

        assert_eq!(access.read(g, "HoldTime", 2300).unwrap(), 2300);
        assert!(!store.has_key(g.hive(), g.subkey()));
    }

    #[test]
    fn read_after_write() {
        let store = MemoryRegistry::new();
        let access = RegistryAccess::new(&store);

        access.write(PathGroup::TouchPad, "RightClickZoneWidth", RegValue::DWord(77)).unwrap();
        assert_eq!(access.read(PathGroup::TouchPad, "RightClickZoneWidth", 50).unwrap(), 77);
        assert_eq!(
            store.get(Hive::CurrentUser, PathGroup::TouchPad.subkey(), "RightClickZoneWidth"),
            Some(RegValue::DWord(77))
        );
    }

    #[test]
    fn read_rejects_uncoercible_values() {
        let store = MemoryRegistry::new();
        let g = PathGroup::Pen;
        store.insert(g.hive(), g.subkey(), "LatencyMode", RegValue::String("low".into()));

        let err = RegistryAccess::new(&store).read(g, "LatencyMode", 1).unwrap_err();
        assert!(matches!(err, RegistryError::UnexpectedType { .. }));
    }

    #[test]
    fn privileged_write_denial_explains_itself() {
        let store = hklm_denied();
        let err = RegistryAccess::new(&store)
            .write(PathGroup::TouchPrediction, "Latency", RegValue::DWord(4))
            .unwrap_err();
        assert!(err.is_access_denied());
        assert!(err.to_string().contains("Administrator rights are required"));
    }

    #[test]
    fn reset_all_isolates_denied_group() {
        let store = hklm_denied();
        let access = RegistryAccess::new(&store);
        access.write(PathGroup::Pen, "PressureSensitivity", RegValue::DWord(9)).unwrap();

        let report = access.reset_all();

        assert_eq!(report.outcomes().len(), 6);
        assert_eq!(report.denied_groups(), vec![PathGroup::TouchPrediction]);
        assert!(!report.is_complete());
        for group in PathGroup::ALL.into_iter().filter(|g| !g.is_privileged()) {
            assert!(matches!(report.outcome(group), Some(ResetOutcome::Succeeded)));
            for (name, value) in group.defaults() {
                assert_eq!(access.read(group, name, -1).unwrap(), *value, "{group} {name}");
            }
        }
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn reset_all_keeps_going_after_generic_failure() {
        let store = MemoryRegistry::new();
        let g = PathGroup::NtPen;
        store.break_key(g.hive(), g.subkey());
        let access = RegistryAccess::new(&store);

        let report = access.reset_all();
        assert!(matches!(report.outcome(g), Some(ResetOutcome::Failed(_))));
        assert!(matches!(report.outcome(PathGroup::TouchPad), Some(ResetOutcome::Succeeded)));
        assert_eq!(access.read(PathGroup::TouchPad, "RightClickZoneHeight", 0).unwrap(), 25);

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, RegistryError::Os { .. }));
    }

    #[test]
    fn denial_outside_privileged_group_is_a_failure() {
        let store = MemoryRegistry::new();
        let g = PathGroup::PenVisualization;
        store.deny_write(g.hive(), g.subkey());

        let report = RegistryAccess::new(&store).reset_all();
        assert!(matches!(report.outcome(g), Some(ResetOutcome::Failed(_))));
        assert!(report.denied_groups().is_empty());
    }

    #[test]
    fn enumerate_tags_and_filters() {
        let store = MemoryRegistry::new();
        let access = RegistryAccess::new(&store);
        access.reset_all();
        let viz = PathGroup::PenVisualization;
        store.insert(viz.hive(), viz.subkey(), "Arrow", RegValue::String("arrow.cur".into()));
        let pad = PathGroup::TouchPad;
        store.insert(pad.hive(), pad.subkey(), "AAPThreshold", RegValue::DWord(2));

        let all = access.enumerate().unwrap();

        assert_eq!(all.get("PressureSensitivity"), Some(&RegValue::DWord(5)));
        assert_eq!(all.get("NT_PenArbitrationType"), Some(&RegValue::DWord(0)));
        assert_eq!(all.get("SysEvent_HoldMode"), Some(&RegValue::DWord(1)));
        assert_eq!(all.get("Viz_PenVisualization"), Some(&RegValue::DWord(0x23)));
        assert_eq!(all.get("TouchPred_Latency"), Some(&RegValue::DWord(8)));
        assert_eq!(all.get("TouchPad_RightClickZoneWidth"), Some(&RegValue::DWord(50)));
        assert!(!all.contains_key("Viz_Arrow"));
        assert!(!all.contains_key("TouchPad_AAPThreshold"));
        assert_eq!(all.len(), 21);
    }

    #[test]
    fn enumerate_without_privilege_omits_machine_wide_entries() {
        let store = hklm_denied();
        let access = RegistryAccess::new(&store);
        access.reset_all();

        let all = access.enumerate().unwrap();

        assert!(all.keys().all(|k| !k.starts_with("TouchPred_")));
        assert_eq!(all.len(), 19);
        assert!(all.contains_key("SysEvent_TapTime"));
        assert!(all.contains_key("TouchPad_RightClickZoneHeight"));
    }

    #[test]
    fn enumerate_propagates_other_failures() {
        let store = MemoryRegistry::new();
        let g = PathGroup::SysEventParameters;
        store.break_key(g.hive(), g.subkey());
        assert!(RegistryAccess::new(&store).enumerate().is_err());
    }
}
