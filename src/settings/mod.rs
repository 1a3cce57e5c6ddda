// pensettings/src/settings/mod.rs
// In-memory settings model with write-through to the registry.

mod setting;

pub use setting::{parse_flag, Setting, SettingKind, SettingValue};

use thiserror::Error;

use crate::registry::{RegValue, RegistryAccess, RegistryError, RegistryStore, ResetReport};
use crate::{info, warn};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{setting} expects a {expected:?} value")]
    KindMismatch {
        setting: Setting,
        expected: SettingKind,
    },

    #[error("'{input}' is not a valid value for {setting}")]
    InvalidValue { setting: Setting, input: String },

    #[error("unknown setting '{0}'")]
    UnknownSetting(String),
}

impl SettingsError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, SettingsError::Registry(e) if e.is_access_denied())
    }
}

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(Setting, SettingValue)>;

/// Every pen and touch setting, mirrored from the registry.
///
/// Getters return the last loaded value; setters write through immediately
/// and notify subscribers. Notifications fire after the in-memory value
/// changes, whether or not the registry write succeeded, so a failed write
/// leaves memory ahead of storage until the next [`PenSettings::load_all`].
pub struct PenSettings<S> {
    access: RegistryAccess<S>,
    values: [SettingValue; Setting::COUNT],
    unreadable: Vec<Setting>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: SubscriptionId,
}

impl<S: RegistryStore> PenSettings<S> {
    /// Build the model and load every setting from the registry.
    pub fn new(access: RegistryAccess<S>) -> Result<Self, SettingsError> {
        let mut settings = Self::unloaded(access);
        settings.load_all()?;
        Ok(settings)
    }

    /// Build the model holding compile-time defaults, without touching storage.
    pub fn unloaded(access: RegistryAccess<S>) -> Self {
        Self {
            access,
            values: Setting::ALL.map(Setting::default_value),
            unreadable: Vec::new(),
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn get(&self, setting: Setting) -> SettingValue {
        self.values[setting.index()]
    }

    #[cfg(test)]
    pub fn get_int(&self, setting: Setting) -> Option<i32> {
        self.get(setting).as_int()
    }

    #[cfg(test)]
    pub fn get_bool(&self, setting: Setting) -> Option<bool> {
        self.get(setting).as_bool()
    }

    /// Settings the last load could not read for lack of rights.
    pub fn unreadable(&self) -> &[Setting] {
        &self.unreadable
    }

    pub fn iter(&self) -> impl Iterator<Item = (Setting, SettingValue)> + '_ {
        Setting::ALL.into_iter().map(|s| (s, self.get(s)))
    }

    /// Change one setting. Returns `Ok(false)` when the value was already set.
    ///
    /// On a failed write the in-memory value and the notification stay as if
    /// it had succeeded and the error is returned.
    pub fn set(&mut self, setting: Setting, value: impl Into<SettingValue>) -> Result<bool, SettingsError> {
        let value = value.into();
        let stored = setting.encode(value).ok_or(SettingsError::KindMismatch {
            setting,
            expected: setting.kind(),
        })?;

        if self.get(setting) == value {
            return Ok(false);
        }

        self.values[setting.index()] = value;
        let partner = setting.partner();
        if let Some(p) = partner {
            self.values[p.index()] = p.decode(stored);
        }

        let written = self
            .access
            .write(setting.group(), setting.value_name(), RegValue::DWord(stored as u32));
        match &written {
            Ok(()) => info!("[Settings] {} = {}", setting, value),
            Err(e) => warn!("[Settings] {} = {} not saved: {}", setting, value, e),
        }

        self.notify(setting);
        if let Some(p) = partner {
            self.notify(p);
        }

        written?;
        Ok(true)
    }

    /// Re-read every setting from the registry and notify once per property.
    /// Memory is only replaced when every read succeeds. Settings of the
    /// privileged group that cannot be read hold their default and are
    /// listed by [`PenSettings::unreadable`].
    pub fn load_all(&mut self) -> Result<(), SettingsError> {
        let mut loaded = self.values;
        let mut unreadable = Vec::new();
        for setting in Setting::ALL {
            let group = setting.group();
            let stored = match self.access.read(group, setting.value_name(), setting.default_stored()) {
                Ok(stored) => stored,
                Err(e) if e.is_access_denied() && group.is_privileged() => {
                    warn!("[Settings] {} is read-only: {}", setting, e);
                    unreadable.push(setting);
                    setting.default_stored()
                }
                Err(e) => return Err(e.into()),
            };
            loaded[setting.index()] = setting.decode(stored);
        }
        self.values = loaded;
        self.unreadable = unreadable;
        info!("[Settings] Loaded {} settings", Setting::COUNT - self.unreadable.len());

        for setting in Setting::ALL {
            self.notify(setting);
        }
        Ok(())
    }

    /// Rewrite every group's defaults, then reload. Groups that could not be
    /// reset are listed in the returned report.
    pub fn reset_to_defaults(&mut self) -> Result<ResetReport, SettingsError> {
        let report = self.access.reset_all();
        self.load_all()?;
        Ok(report)
    }

    /// Register a callback run with each changed property and its new value.
    pub fn subscribe(&mut self, listener: impl FnMut(Setting, SettingValue) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(i, _)| *i != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, setting: Setting) {
        let value = self.values[setting.index()];
        for (_, listener) in self.listeners.iter_mut() {
            listener(setting, value);
        }
    }
}
