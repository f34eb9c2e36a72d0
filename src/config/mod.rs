use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorSettings,
    pub cloud: CloudConfig,
    pub analysis: AnalysisConfig,
    pub api: ApiConfig,
}

/// Detection and recording settings.
///
/// Captured as an immutable snapshot when monitoring starts; the engine never
/// re-reads these mid-session. Updates are only accepted while monitoring is
/// stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Motion sensitivity dial, 1..=100. Higher is more sensitive
    /// (lower numeric threshold).
    pub motion_sensitivity: u8,
    /// Sound sensitivity, 1..=100, compared directly against the RMS score.
    pub sound_sensitivity: u8,
    /// Length of each triggered recording, 5..=300 seconds.
    pub recording_duration_secs: u16,
    /// Start a cloud save as soon as a recording is finalized.
    pub auto_sync: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            motion_sensitivity: 20,
            sound_sensitivity: 10,
            recording_duration_secs: 10,
            auto_sync: false,
        }
    }
}

impl MonitorSettings {
    pub const SENSITIVITY_RANGE: std::ops::RangeInclusive<u8> = 1..=100;
    pub const DURATION_RANGE: std::ops::RangeInclusive<u16> = 5..=300;

    /// Clamp out-of-range values, logging what was adjusted.
    pub fn clamped(mut self) -> Self {
        if !Self::SENSITIVITY_RANGE.contains(&self.motion_sensitivity) {
            warn!(
                "motion_sensitivity {} out of range, clamping",
                self.motion_sensitivity
            );
            self.motion_sensitivity = self.motion_sensitivity.clamp(1, 100);
        }
        if !Self::SENSITIVITY_RANGE.contains(&self.sound_sensitivity) {
            warn!(
                "sound_sensitivity {} out of range, clamping",
                self.sound_sensitivity
            );
            self.sound_sensitivity = self.sound_sensitivity.clamp(1, 100);
        }
        if !Self::DURATION_RANGE.contains(&self.recording_duration_secs) {
            warn!(
                "recording_duration_secs {} out of range, clamping",
                self.recording_duration_secs
            );
            self.recording_duration_secs = self.recording_duration_secs.clamp(5, 300);
        }
        self
    }
}

/// Thread-safe handle to the current monitor settings, shared between the
/// API handlers and the service loop. The engine still snapshots a value at
/// session start; this handle only feeds that snapshot.
#[derive(Clone)]
pub struct SettingsHandle {
    inner: std::sync::Arc<tokio::sync::Mutex<MonitorSettings>>,
}

impl SettingsHandle {
    pub fn new(settings: MonitorSettings) -> Self {
        Self {
            inner: std::sync::Arc::new(tokio::sync::Mutex::new(settings)),
        }
    }

    pub async fn get(&self) -> MonitorSettings {
        *self.inner.lock().await
    }

    pub async fn set(&self, settings: MonitorSettings) {
        *self.inner.lock().await = settings.clamped();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Upload endpoint for finished clips. Empty means cloud sync is
    /// unconfigured and save requests fail with a clear message.
    pub endpoint: String,
    pub api_key: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Falls back to the GEMINI_API_KEY env var when empty.
    pub api_key: String,
    pub model: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3839 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let mut config: Self = toml::from_str(&content).context("Failed to parse config file")?;
        config.monitor = config.monitor.clamped();

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
