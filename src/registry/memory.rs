// pensettings/src/registry/memory.rs
// In-process stand-in for the registry. Backs the tests and non-Windows builds.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
};

use super::{
    error::RegistryError,
    group::Hive,
    store::{full_path, RegValue, RegistryStore},
};

type KeyId = (Hive, String);

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    keys: RefCell<BTreeMap<KeyId, BTreeMap<String, RegValue>>>,
    denied_reads: RefCell<BTreeSet<KeyId>>,
    denied_writes: RefCell<BTreeSet<KeyId>>,
    broken: RefCell<BTreeSet<KeyId>>,
}

// Key paths are case-insensitive in the real registry.
fn key_id(hive: Hive, path: &str) -> KeyId {
    (hive, path.to_ascii_lowercase())
}

// ERROR_INVALID_HANDLE, reported for keys marked broken
const BROKEN_KEY_CODE: u32 = 6;

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opening the key for reading fails with access denied.
    #[cfg(test)]
    pub fn deny_read(&self, hive: Hive, path: &str) {
        self.denied_reads.borrow_mut().insert(key_id(hive, path));
    }

    /// Opening the key for writing fails with access denied.
    #[cfg(test)]
    pub fn deny_write(&self, hive: Hive, path: &str) {
        self.denied_writes.borrow_mut().insert(key_id(hive, path));
    }

    /// Every access to the key fails with a generic OS error.
    #[cfg(test)]
    pub fn break_key(&self, hive: Hive, path: &str) {
        self.broken.borrow_mut().insert(key_id(hive, path));
    }

    pub fn insert(&self, hive: Hive, path: &str, name: &str, value: RegValue) {
        self.keys
            .borrow_mut()
            .entry(key_id(hive, path))
            .or_default()
            .insert(name.to_string(), value);
    }

    pub fn get(&self, hive: Hive, path: &str, name: &str) -> Option<RegValue> {
        self.keys
            .borrow()
            .get(&key_id(hive, path))
            .and_then(|values| values.get(name).cloned())
    }

    #[cfg(test)]
    pub fn has_key(&self, hive: Hive, path: &str) -> bool {
        self.keys.borrow().contains_key(&key_id(hive, path))
    }

    fn check(&self, op: &'static str, hive: Hive, path: &str, write: bool) -> Result<(), RegistryError> {
        let id = key_id(hive, path);
        if self.broken.borrow().contains(&id) {
            return Err(RegistryError::Os {
                op,
                path: full_path(hive, path),
                code: BROKEN_KEY_CODE,
            });
        }
        let denied = if write { &self.denied_writes } else { &self.denied_reads };
        if denied.borrow().contains(&id) {
            return Err(RegistryError::access_denied(full_path(hive, path)));
        }
        Ok(())
    }
}

impl RegistryStore for MemoryRegistry {
    fn read_value(&self, hive: Hive, path: &str, name: &str) -> Result<Option<RegValue>, RegistryError> {
        self.check("open", hive, path, false)?;
        Ok(self.get(hive, path, name))
    }

    fn write_value(&self, hive: Hive, path: &str, name: &str, value: &RegValue) -> Result<(), RegistryError> {
        self.check("create", hive, path, true)?;
        self.insert(hive, path, name, value.clone());
        Ok(())
    }

    fn values(&self, hive: Hive, path: &str) -> Result<Option<Vec<(String, RegValue)>>, RegistryError> {
        self.check("open", hive, path, false)?;
        Ok(self.keys.borrow().get(&key_id(hive, path)).map(|values| {
            values
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = r"SOFTWARE\Test";

    #[test]
    fn read_of_missing_key_does_not_create_it() {
        let store = MemoryRegistry::new();
        assert_eq!(store.read_value(Hive::CurrentUser, PATH, "Value").unwrap(), None);
        assert_eq!(store.values(Hive::CurrentUser, PATH).unwrap(), None);
        assert!(!store.has_key(Hive::CurrentUser, PATH));
    }

    #[test]
    fn key_paths_ignore_case() {
        let store = MemoryRegistry::new();
        store.write_value(Hive::CurrentUser, PATH, "Value", &RegValue::DWord(3)).unwrap();
        assert_eq!(
            store.read_value(Hive::CurrentUser, r"software\TEST", "Value").unwrap(),
            Some(RegValue::DWord(3))
        );
        assert!(!store.has_key(Hive::LocalMachine, PATH));
    }

    #[test]
    fn denied_write_leaves_store_untouched() {
        let store = MemoryRegistry::new();
        store.deny_write(Hive::LocalMachine, PATH);
        let err = store
            .write_value(Hive::LocalMachine, PATH, "Value", &RegValue::DWord(1))
            .unwrap_err();
        assert!(err.is_access_denied());
        assert!(!store.has_key(Hive::LocalMachine, PATH));
        // reads of the same key stay allowed
        assert_eq!(store.read_value(Hive::LocalMachine, PATH, "Value").unwrap(), None);
    }

    #[test]
    fn broken_key_reports_os_error() {
        let store = MemoryRegistry::new();
        store.break_key(Hive::CurrentUser, PATH);
        let err = store.values(Hive::CurrentUser, PATH).unwrap_err();
        assert!(!err.is_access_denied());
        assert!(matches!(err, RegistryError::Os { code: BROKEN_KEY_CODE, .. }));
    }
}
