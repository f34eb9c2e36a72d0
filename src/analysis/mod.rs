//! AI content analysis collaborator.
//!
//! The store hands over one representative still frame (JPEG bytes) and gets
//! back a short textual description. Failures never propagate past the
//! store: they become error text on the recording.

pub mod gemini;

pub use gemini::GeminiAnalysis;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::AnalysisConfig;

/// Describes a single still image. Seconds-scale and slow; callers must not
/// hold locks across `analyze`.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, still_jpeg: &[u8]) -> Result<String>;
}

pub fn build(config: &AnalysisConfig) -> Arc<dyn AnalysisService> {
    Arc::new(GeminiAnalysis::new(config))
}
