use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

const DEBUG_PERSIST_MS: u64 = 1_000;

/// Loop timings, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoopCadence {
    pub poll_ms: u64,
    pub refresh_ms: u64,
    pub drowsiness_ms: u64,
    pub persist_ms: u64,
    /// Minimum gap between two low-blink-rate reminders.
    pub blink_reminder_cooldown_ms: u64,
}

impl Default for LoopCadence {
    fn default() -> Self {
        Self {
            poll_ms: 50,
            refresh_ms: 100,
            drowsiness_ms: 500,
            persist_ms: 5_000,
            blink_reminder_cooldown_ms: 60_000,
        }
    }
}

impl LoopCadence {
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn drowsiness(&self) -> Duration {
        Duration::from_millis(self.drowsiness_ms)
    }

    pub fn persist(&self) -> Duration {
        Duration::from_millis(self.persist_ms)
    }

    pub fn blink_reminder_cooldown(&self) -> Duration {
        Duration::from_millis(self.blink_reminder_cooldown_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_ms == 0 {
            return Err(anyhow!("poll_ms must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults to `<data dir>/eyecare/eyecare.sqlite3`.
    pub database_path: Option<PathBuf>,
    /// Defaults to the user's downloads directory.
    pub export_dir: Option<PathBuf>,
    pub cadence: LoopCadence,
    /// Desktop hosts have no runtime camera prompt; mobile hosts start with
    /// this off and flip it once the OS grants access.
    pub camera_permission_granted: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            export_dir: None,
            cadence: LoopCadence::default(),
            camera_permission_granted: true,
        }
    }
}

impl AppConfig {
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| app_data_dir().join("eyecare.sqlite3"))
    }

    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(app_data_dir)
    }

    /// `EYECARE_DEBUG=1` persists every second instead of every five.
    pub fn apply_env_overrides(mut self) -> Self {
        let debug_mode = std::env::var("EYECARE_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if debug_mode {
            self.cadence.persist_ms = DEBUG_PERSIST_MS;
        }
        self
    }
}

pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("eyecare")
}

pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<AppConfig>,
}

impl ConfigStore {
    /// Load `path`, falling back to defaults when it is missing or unreadable.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed config {}: {err}", path.display());
                AppConfig::default()
            })
        } else {
            AppConfig::default()
        };

        data.cadence.validate()?;

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn config(&self) -> AppConfig {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, config: AppConfig) -> Result<()> {
        config.cadence.validate()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("config lock poisoned"))?;
        self.persist(&config)?;
        *guard = config;
        Ok(())
    }

    fn persist(&self, data: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json")).unwrap();
        let config = store.config();

        assert_eq!(config.cadence, LoopCadence::default());
        assert_eq!(config.cadence.persist_ms, 5_000);
        assert!(config.camera_permission_granted);
    }

    #[test]
    fn partial_file_fills_in_defaults_and_updates_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "cadence": { "persist_ms": 2000 } }"#).unwrap();

        let store = ConfigStore::new(path.clone()).unwrap();
        let mut config = store.config();
        assert_eq!(config.cadence.persist_ms, 2_000);
        assert_eq!(config.cadence.poll_ms, 50);

        config.export_dir = Some(dir.path().join("exports"));
        store.update(config.clone()).unwrap();

        let reloaded = ConfigStore::new(path).unwrap();
        assert_eq!(reloaded.config(), config);
        assert_eq!(reloaded.config().resolved_export_dir(), dir.path().join("exports"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json")).unwrap();
        let mut config = store.config();
        config.cadence.poll_ms = 0;
        assert!(store.update(config).is_err());
    }
}
