use serde::Serialize;
use std::fmt;

use super::{error::RegistryError, group::Hive};

/// A value as found in (or written to) a registry key. The variant is the
/// registry type it is stored under.
///
/// Settings are written as DWORDs; the other forms come from the Win32 decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
#[cfg_attr(not(windows), allow(dead_code))]
pub enum RegValue {
    DWord(u32),
    QWord(u64),
    String(String),
    Other { kind: u32, len: usize },
}

impl RegValue {
    /// Coerce to the 32-bit integer the settings are expressed in.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            RegValue::DWord(v) => Some(*v as i32),
            RegValue::QWord(v) => i32::try_from(*v as i64).ok(),
            RegValue::String(s) => s.trim().parse().ok(),
            RegValue::Other { .. } => None,
        }
    }

    pub fn kind_name(&self) -> String {
        match self {
            RegValue::DWord(_) => "REG_DWORD".into(),
            RegValue::QWord(_) => "REG_QWORD".into(),
            RegValue::String(_) => "REG_SZ".into(),
            RegValue::Other { kind, .. } => format!("type {kind}"),
        }
    }
}

impl fmt::Display for RegValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegValue::DWord(v) => write!(f, "{v}"),
            RegValue::QWord(v) => write!(f, "{v}"),
            RegValue::String(s) => write!(f, "\"{s}\""),
            RegValue::Other { kind, len } => write!(f, "<{len} bytes, type {kind}>"),
        }
    }
}

/// The narrow capability every registry access goes through.
///
/// Each call opens the key it needs and releases it before returning; no
/// handle outlives a call.
pub trait RegistryStore {
    /// Read one value. `Ok(None)` when the key or the value does not exist.
    /// Never creates the key.
    fn read_value(&self, hive: Hive, path: &str, name: &str) -> Result<Option<RegValue>, RegistryError>;

    /// Store one value, creating the key when it is missing.
    fn write_value(&self, hive: Hive, path: &str, name: &str, value: &RegValue) -> Result<(), RegistryError>;

    /// Every value stored directly under the key, `Ok(None)` when the key is missing.
    fn values(&self, hive: Hive, path: &str) -> Result<Option<Vec<(String, RegValue)>>, RegistryError>;
}

impl<T: RegistryStore + ?Sized> RegistryStore for &T {
    fn read_value(&self, hive: Hive, path: &str, name: &str) -> Result<Option<RegValue>, RegistryError> {
        (**self).read_value(hive, path, name)
    }

    fn write_value(&self, hive: Hive, path: &str, name: &str, value: &RegValue) -> Result<(), RegistryError> {
        (**self).write_value(hive, path, name, value)
    }

    fn values(&self, hive: Hive, path: &str) -> Result<Option<Vec<(String, RegValue)>>, RegistryError> {
        (**self).values(hive, path)
    }
}

pub fn full_path(hive: Hive, path: &str) -> String {
    format!(r"{hive}\{path}")
}
