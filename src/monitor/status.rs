//! Monitoring status types and shared state handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::MonitorSettings;
use crate::detector::TriggerSource;

/// Phase of a monitoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorPhase {
    Idle,
    RequestingPermissions,
    Monitoring,
    Recording,
    Error,
}

impl MonitorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RequestingPermissions => "requesting_permissions",
            Self::Monitoring => "monitoring",
            Self::Recording => "recording",
            Self::Error => "error",
        }
    }

    /// Human-readable status line, mirrored by UIs.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Idle => "Idle. Start monitoring to begin.",
            Self::RequestingPermissions => "Requesting permissions...",
            Self::Monitoring => "Monitoring for motion and sound...",
            Self::Recording => "Triggered! Recording...",
            Self::Error => "Monitoring stopped on a fault.",
        }
    }
}

/// Current monitoring state, readable by API handlers.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub phase: MonitorPhase,
    pub started_at: Option<DateTime<Utc>>,
    pub settings: Option<MonitorSettings>,
    pub last_trigger: Option<TriggerSource>,
    pub last_error: Option<String>,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            phase: MonitorPhase::Idle,
            started_at: None,
            settings: None,
            last_trigger: None,
            last_error: None,
        }
    }
}

impl MonitorState {
    /// Seconds since monitoring started.
    pub fn uptime_seconds(&self) -> Option<u64> {
        self.started_at.map(|started| {
            let elapsed = Utc::now() - started;
            elapsed.num_seconds().max(0) as u64
        })
    }
}

/// Thread-safe handle for sharing monitor state between the machine and API
/// handlers.
#[derive(Clone, Default)]
pub struct MonitorStatusHandle {
    inner: Arc<Mutex<MonitorState>>,
}

impl MonitorStatusHandle {
    pub async fn get(&self) -> MonitorState {
        self.inner.lock().await.clone()
    }

    pub async fn set_phase(&self, phase: MonitorPhase) {
        let mut state = self.inner.lock().await;
        state.phase = phase;
    }

    /// Session began: snapshot the settings it runs with.
    pub async fn begin_monitoring(&self, settings: MonitorSettings) {
        let mut state = self.inner.lock().await;
        state.phase = MonitorPhase::Monitoring;
        state.started_at = Some(Utc::now());
        state.settings = Some(settings);
        state.last_trigger = None;
        state.last_error = None;
    }

    pub async fn record_trigger(&self, source: TriggerSource) {
        let mut state = self.inner.lock().await;
        state.phase = MonitorPhase::Recording;
        state.last_trigger = Some(source);
    }

    pub async fn set_error(&self, error: String) {
        let mut state = self.inner.lock().await;
        state.phase = MonitorPhase::Error;
        state.last_error = Some(error);
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        *state = MonitorState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_as_str() {
        assert_eq!(MonitorPhase::Idle.as_str(), "idle");
        assert_eq!(
            MonitorPhase::RequestingPermissions.as_str(),
            "requesting_permissions"
        );
        assert_eq!(MonitorPhase::Monitoring.as_str(), "monitoring");
        assert_eq!(MonitorPhase::Recording.as_str(), "recording");
        assert_eq!(MonitorPhase::Error.as_str(), "error");
    }

    #[test]
    fn test_phase_messages_track_coordinator_state() {
        assert_eq!(
            MonitorPhase::Monitoring.message(),
            "Monitoring for motion and sound..."
        );
        assert_eq!(MonitorPhase::Recording.message(), "Triggered! Recording...");
    }

    #[test]
    fn test_state_default() {
        let state = MonitorState::default();
        assert_eq!(state.phase, MonitorPhase::Idle);
        assert!(state.started_at.is_none());
        assert!(state.settings.is_none());
        assert!(state.last_trigger.is_none());
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_begin_monitoring_snapshots_settings() {
        let handle = MonitorStatusHandle::default();
        handle.begin_monitoring(MonitorSettings::default()).await;

        let state = handle.get().await;
        assert_eq!(state.phase, MonitorPhase::Monitoring);
        assert_eq!(state.settings, Some(MonitorSettings::default()));
        assert!(state.started_at.is_some());
    }

    #[tokio::test]
    async fn test_trigger_moves_to_recording() {
        let handle = MonitorStatusHandle::default();
        handle.begin_monitoring(MonitorSettings::default()).await;
        handle.record_trigger(TriggerSource::Motion).await;

        let state = handle.get().await;
        assert_eq!(state.phase, MonitorPhase::Recording);
        assert_eq!(state.last_trigger, Some(TriggerSource::Motion));
    }

    #[tokio::test]
    async fn test_error_and_reset() {
        let handle = MonitorStatusHandle::default();
        handle.set_error("camera denied".to_string()).await;

        let state = handle.get().await;
        assert_eq!(state.phase, MonitorPhase::Error);
        assert_eq!(state.last_error, Some("camera denied".to_string()));

        handle.reset().await;
        assert_eq!(handle.get().await.phase, MonitorPhase::Idle);
    }
}
