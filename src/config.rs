// pensettings/src/config.rs

use serde::{Deserialize, Serialize};
use std::{
    io,
    path::Path,
    sync::{OnceLock, PoisonError, RwLock},
};
use crate::{info, warn, error};
use crate::paths::config_path;
use crate::settings::parse_flag;

/// Application configuration persisted in config.yaml next to the executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Record `info!` lines in pensettings.log.
    #[serde(default)]
    pub debug_logging: bool,

    /// Ask before rewriting every group with its defaults.
    #[serde(default = "default_confirm_reset")]
    pub confirm_reset: bool,

    /// Print `show` and `dump` as JSON unless overridden on the command line.
    #[serde(default)]
    pub json_output: bool,
}

fn default_confirm_reset() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            confirm_reset: default_confirm_reset(),
            json_output: false,
        }
    }
}

impl AppConfig {
    /// Apply a `key = value` pair from the command line.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        let flag = parse_flag(value)
            .ok_or_else(|| format!("Invalid value '{value}' for '{key}', expected true/false"))?;
        match key {
            "debug_logging" => self.debug_logging = flag,
            "confirm_reset" => self.confirm_reset = flag,
            "json_output" => self.json_output = flag,
            _ => return Err(format!("Unknown config key: {key}")),
        }
        Ok(())
    }
}

// ── Process-wide snapshot ──

static CONFIG: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn global_config() -> &'static RwLock<AppConfig> {
    CONFIG.get_or_init(|| RwLock::new(AppConfig::default()))
}

/// Load config.yaml (or create it with defaults). Call once at startup.
pub fn load_config() -> AppConfig {
    let cfg = load_from(&config_path());
    *global_config().write().unwrap_or_else(PoisonError::into_inner) = cfg.clone();
    cfg
}

/// Return a snapshot of the current in-memory config.
pub fn current_config() -> AppConfig {
    global_config().read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Change one key at runtime and persist the result.
pub fn set_config_value(key: &str, value: &str) -> Result<AppConfig, String> {
    let mut cfg = global_config().write().unwrap_or_else(PoisonError::into_inner);
    let next = update_at(&config_path(), &cfg, key, value)?;
    *cfg = next.clone();
    Ok(next)
}

/// The in-memory config only changes once the file has been written.
fn update_at(path: &Path, current: &AppConfig, key: &str, value: &str) -> Result<AppConfig, String> {
    let mut next = current.clone();
    next.apply(key, value)?;
    save_to(path, &next).map_err(|e| {
        error!("Failed to write {}: {e}", path.display());
        format!("Failed to write {}: {e}", path.display())
    })?;
    info!("Config '{}' set to '{}'", key, value);
    Ok(next)
}

fn load_from(path: &Path) -> AppConfig {
    if !path.exists() {
        info!("No config.yaml found, creating defaults at {}", path.display());
        let defaults = AppConfig::default();
        if let Err(e) = save_to(path, &defaults) {
            error!("Failed to write config.yaml: {e}");
        }
        return defaults;
    }

    match std::fs::read_to_string(path) {
        Ok(text) => match serde_yaml::from_str::<AppConfig>(&text) {
            Ok(c) => {
                info!("Loaded config from {}", path.display());
                c
            }
            Err(e) => {
                warn!("Failed to parse config.yaml, using defaults: {e}");
                AppConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read config.yaml, using defaults: {e}");
            AppConfig::default()
        }
    }
}

fn save_to(path: &Path, cfg: &AppConfig) -> io::Result<()> {
    let text = serde_yaml::to_string(cfg).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, text)
}
