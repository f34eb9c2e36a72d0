//! Motion and sound detection.
//!
//! Both detectors are pure scoring types: the sampler loops in
//! `monitor::machine` feed them frames and audio blocks on fixed cadences
//! and forward any resulting [`TriggerEvent`] to the coordinator.

pub mod motion;
pub mod sound;

pub use motion::MotionDetector;
pub use sound::SoundDetector;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which detector produced a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    Motion,
    Sound,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Motion => "motion",
            Self::Sound => "sound",
        }
    }
}

/// A detector's decision that measured activity exceeded its threshold.
/// Ephemeral: sent to the coordinator and dropped, never retained.
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub source: TriggerSource,
    pub score: f64,
    pub at: DateTime<Utc>,
}

impl TriggerEvent {
    pub fn now(source: TriggerSource, score: f64) -> Self {
        Self {
            source,
            score,
            at: Utc::now(),
        }
    }
}
