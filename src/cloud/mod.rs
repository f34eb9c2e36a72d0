//! Cloud sync collaborator.
//!
//! The transport is opaque to the engine: `save` either succeeds or fails,
//! and the store maps that onto the recording's cloud status. On success the
//! store also exports the clip locally via [`export_clip`].

pub mod http;

pub use http::HttpCloudSync;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::CloudConfig;
use crate::media::MediaHandle;

/// Uploads a finished clip somewhere durable. Seconds-scale and slow;
/// callers must not hold locks across `save`.
#[async_trait]
pub trait CloudSync: Send + Sync {
    async fn save(&self, media: &MediaHandle) -> Result<()>;
}

/// Build the configured provider, or a stand-in that fails every save with
/// a clear message when no endpoint is set.
pub fn build(config: &CloudConfig) -> Arc<dyn CloudSync> {
    if config.endpoint.is_empty() {
        Arc::new(Unconfigured)
    } else {
        Arc::new(HttpCloudSync::new(
            config.endpoint.clone(),
            config.api_key.clone(),
        ))
    }
}

struct Unconfigured;

#[async_trait]
impl CloudSync for Unconfigured {
    async fn save(&self, _media: &MediaHandle) -> Result<()> {
        bail!("Cloud sync is not configured (set [cloud] endpoint in config.toml)")
    }
}

/// Export filename for a saved clip: ISO8601 timestamp with `:` and `.`
/// replaced so it is filesystem-safe everywhere.
pub fn export_filename(timestamp: DateTime<Utc>, extension: &str) -> String {
    let stamp = timestamp
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("security-event-{stamp}.{extension}")
}

/// Write the clip into the exports directory after a successful cloud save.
pub fn export_clip(
    dir: &Path,
    timestamp: DateTime<Utc>,
    media: &MediaHandle,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(timestamp, media.extension()));
    std::fs::write(&path, media.bytes())?;
    info!("Exported clip to {:?}", path);
    Ok(path)
}
