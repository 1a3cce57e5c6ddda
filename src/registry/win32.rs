// pensettings/src/registry/win32.rs

use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, WIN32_ERROR,
};
use windows::Win32::System::Registry::*;

use super::{
    error::RegistryError,
    group::Hive,
    store::{full_path, RegValue, RegistryStore},
};
use crate::{info, warn};

// Longest value name the registry allows, plus the terminator.
const MAX_VALUE_NAME: usize = 16_384;

/// The live Windows registry, accessed through the Win32 API.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRegistry;

/// An open key, closed when dropped.
struct OpenKey(HKEY);

impl Drop for OpenKey {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

fn root(hive: Hive) -> HKEY {
    match hive {
        Hive::CurrentUser => HKEY_CURRENT_USER,
        Hive::LocalMachine => HKEY_LOCAL_MACHINE,
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

fn status_error(op: &'static str, hive: Hive, path: &str, status: WIN32_ERROR) -> RegistryError {
    if status == ERROR_ACCESS_DENIED {
        RegistryError::access_denied(full_path(hive, path))
    } else {
        RegistryError::Os {
            op,
            path: full_path(hive, path),
            code: status.0,
        }
    }
}

/// Open an existing key read-only. `Ok(None)` when it does not exist.
fn open_read(hive: Hive, path: &str) -> Result<Option<OpenKey>, RegistryError> {
    let path_w = to_wide(path);
    let mut key = HKEY::default();

    let status = unsafe { RegOpenKeyExW(root(hive), PCWSTR(path_w.as_ptr()), None, KEY_READ, &mut key) };

    if status == ERROR_SUCCESS {
        Ok(Some(OpenKey(key)))
    } else if status == ERROR_FILE_NOT_FOUND {
        Ok(None)
    } else {
        warn!("[Registry] Failed to open key '{}': {:#X}", full_path(hive, path), status.0);
        Err(status_error("open", hive, path, status))
    }
}

/// Create or open a key with write access.
fn open_write(hive: Hive, path: &str) -> Result<OpenKey, RegistryError> {
    let path_w = to_wide(path);
    let mut key = HKEY::default();

    let status = unsafe {
        RegCreateKeyExW(
            root(hive),
            PCWSTR(path_w.as_ptr()),
            None,
            PCWSTR::null(),
            REG_OPTION_NON_VOLATILE,
            KEY_SET_VALUE,
            None,
            &mut key,
            None,
        )
    };

    if status != ERROR_SUCCESS {
        warn!("[Registry] Failed to create/open key '{}': {:#X}", full_path(hive, path), status.0);
        return Err(status_error("create", hive, path, status));
    }
    Ok(OpenKey(key))
}

/// Query one value of an open key. `Ok(None)` when the value does not exist.
fn query(key: &OpenKey, hive: Hive, path: &str, name: &str) -> Result<Option<RegValue>, RegistryError> {
    let name_w = to_wide(name);
    let mut kind = REG_VALUE_TYPE::default();
    let mut len = 0u32;

    // size query
    let status = unsafe {
        RegQueryValueExW(
            key.0,
            PCWSTR(name_w.as_ptr()),
            None,
            Some(&mut kind as *mut REG_VALUE_TYPE),
            None,
            Some(&mut len as *mut u32),
        )
    };
    if status == ERROR_FILE_NOT_FOUND {
        return Ok(None);
    }
    if status != ERROR_SUCCESS {
        return Err(status_error("query", hive, path, status));
    }

    let mut data = vec![0u8; len as usize];
    let status = unsafe {
        RegQueryValueExW(
            key.0,
            PCWSTR(name_w.as_ptr()),
            None,
            Some(&mut kind as *mut REG_VALUE_TYPE),
            Some(data.as_mut_ptr()),
            Some(&mut len as *mut u32),
        )
    };
    if status != ERROR_SUCCESS {
        return Err(status_error("query", hive, path, status));
    }
    data.truncate(len as usize);

    Ok(Some(decode(kind, &data)))
}

fn decode(kind: REG_VALUE_TYPE, data: &[u8]) -> RegValue {
    if kind == REG_DWORD && data.len() >= 4 {
        RegValue::DWord(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
    } else if kind == REG_QWORD && data.len() >= 8 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&data[..8]);
        RegValue::QWord(u64::from_le_bytes(bytes))
    } else if kind == REG_SZ || kind == REG_EXPAND_SZ {
        let wide: Vec<u16> = data
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .take_while(|c| *c != 0)
            .collect();
        RegValue::String(String::from_utf16_lossy(&wide))
    } else {
        RegValue::Other { kind: kind.0, len: data.len() }
    }
}

fn encode(value: &RegValue) -> Option<(REG_VALUE_TYPE, Vec<u8>)> {
    match value {
        RegValue::DWord(v) => Some((REG_DWORD, v.to_le_bytes().to_vec())),
        RegValue::QWord(v) => Some((REG_QWORD, v.to_le_bytes().to_vec())),
        RegValue::String(s) => {
            let bytes = to_wide(s).iter().flat_map(|c| c.to_le_bytes()).collect();
            Some((REG_SZ, bytes))
        }
        RegValue::Other { .. } => None,
    }
}

impl RegistryStore for WindowsRegistry {
    fn read_value(&self, hive: Hive, path: &str, name: &str) -> Result<Option<RegValue>, RegistryError> {
        match open_read(hive, path)? {
            Some(key) => query(&key, hive, path, name),
            None => Ok(None),
        }
    }

    fn write_value(&self, hive: Hive, path: &str, name: &str, value: &RegValue) -> Result<(), RegistryError> {
        let (kind, data) = encode(value).ok_or_else(|| RegistryError::UnexpectedType {
            path: full_path(hive, path),
            name: name.to_string(),
            kind: value.kind_name(),
        })?;

        let key = open_write(hive, path)?;
        let name_w = to_wide(name);

        let status = unsafe { RegSetValueExW(key.0, PCWSTR(name_w.as_ptr()), None, kind, Some(data.as_slice())) };

        if status != ERROR_SUCCESS {
            warn!("[Registry] Failed to set '{}={}' in key '{}': {:#X}", name, value, full_path(hive, path), status.0);
            return Err(status_error("set", hive, path, status));
        }

        info!("[Registry] Set '{}={}' in key '{}'", name, value, full_path(hive, path));
        Ok(())
    }

    fn values(&self, hive: Hive, path: &str) -> Result<Option<Vec<(String, RegValue)>>, RegistryError> {
        let Some(key) = open_read(hive, path)? else {
            return Ok(None);
        };

        let mut names = Vec::new();
        let mut buffer = vec![0u16; MAX_VALUE_NAME];
        let mut index = 0u32;
        loop {
            let mut len = buffer.len() as u32;
            let status = unsafe {
                RegEnumValueW(
                    key.0,
                    index,
                    Some(PWSTR(buffer.as_mut_ptr())),
                    &mut len,
                    None,
                    None,
                    None,
                    None,
                )
            };
            if status == ERROR_NO_MORE_ITEMS {
                break;
            }
            if status != ERROR_SUCCESS {
                return Err(status_error("enumerate", hive, path, status));
            }
            names.push(String::from_utf16_lossy(&buffer[..len as usize]));
            index += 1;
        }

        let mut values = Vec::with_capacity(names.len());
        for name in names {
            if let Some(value) = query(&key, hive, path, &name)? {
                values.push((name, value));
            }
        }
        Ok(Some(values))
    }
}
