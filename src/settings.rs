use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::audio::{AmbientSound, CueTable};
use crate::report::DEFAULT_ABANDON_THRESHOLD_SECS;
use crate::timer::pattern::DEFAULT_BREATHING_PATTERN;
use crate::voice::VoicePreference;

pub const API_URL_ENV: &str = "MINDWELL_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Where completion records go. Unset means log only.
    pub api_base_url: Option<String>,
    pub muted: bool,
    pub volume: f32,
    pub abandon_threshold_secs: u64,
    pub tick_interval_ms: u64,
    pub cue_frequencies: CueTable,
    pub breathing_pattern: String,
    pub meditation_minutes: u32,
    pub ambient_sound: AmbientSound,
    pub voice: VoicePreference,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            muted: false,
            volume: 0.3,
            abandon_threshold_secs: DEFAULT_ABANDON_THRESHOLD_SECS,
            tick_interval_ms: 1000,
            cue_frequencies: CueTable::default(),
            breathing_pattern: DEFAULT_BREATHING_PATTERN.into(),
            meditation_minutes: 5,
            ambient_sound: AmbientSound::Rain,
            voice: VoicePreference::default(),
        }
    }
}

impl Settings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Environment wins over the file.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = Some(url.trim().to_string());
            }
        }
    }
}

/// JSON-file backed settings shared across the app.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings {}: {}", path.display(), err);
                Settings::default()
            })
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Settings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `change` and write the result to disk.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut guard);
        self.persist(&guard)?;
        Ok(guard.clone())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update(|s| {
                s.muted = true;
                s.breathing_pattern = "4-7-8".into();
                s.ambient_sound = AmbientSound::Bells;
            })
            .unwrap();

        let reloaded = SettingsStore::new(path).unwrap().get();
        assert!(reloaded.muted);
        assert_eq!(reloaded.breathing_pattern, "4-7-8");
        assert_eq!(reloaded.ambient_sound, AmbientSound::Bells);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "volume": 0.8, "cueFrequencies": { "hold": 500.0 } }"#).unwrap();
        let settings = SettingsStore::new(path).unwrap().get();
        assert_eq!(settings.volume, 0.8);
        assert_eq!(settings.cue_frequencies.hold, 500.0);
        assert_eq!(settings.cue_frequencies.inhale, 523.0);
        assert_eq!(settings.abandon_threshold_secs, 60);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(SettingsStore::new(path).unwrap().get(), Settings::default());
    }

    #[test]
    fn zero_tick_interval_is_clamped() {
        let settings = Settings {
            tick_interval_ms: 0,
            ..Settings::default()
        };
        assert_eq!(settings.tick_interval(), Duration::from_millis(1));
    }
}
