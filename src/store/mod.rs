//! In-memory store of completed recordings and their cloud/analysis state.
//!
//! The store holds everything for the life of the process; nothing is
//! persisted. Cloud-save and analysis run as independent operations per
//! recording: the per-id `cloud_status` and `analyzing` guards are flipped
//! inside the lock, the slow provider call happens outside it, and the
//! result is applied only if the recording still exists afterwards —
//! deleting a recording mid-flight just discards the late result.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::analysis::AnalysisService;
use crate::cloud::{self, CloudSync};
use crate::media::MediaHandle;

/// Cloud-sync state of one recording.
///
/// Transitions only `Local -> Saving -> {Saved | Error}`. `Saved` is
/// terminal; `Error` may be retried by a new explicit save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudStatus {
    Local,
    Saving,
    Saved,
    Error,
}

impl CloudStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Saving => "saving",
            Self::Saved => "saved",
            Self::Error => "error",
        }
    }
}

/// A finalized recording plus its asynchronous sub-state.
#[derive(Debug, Clone)]
pub struct Recording {
    pub id: Uuid,
    pub media: MediaHandle,
    pub timestamp: DateTime<Utc>,
    pub analysis: Option<String>,
    pub cloud_status: CloudStatus,
    pub analyzing: bool,
}

impl Recording {
    fn new(media: MediaHandle) -> Self {
        Self {
            id: Uuid::new_v4(),
            media,
            timestamp: Utc::now(),
            analysis: None,
            cloud_status: CloudStatus::Local,
            analyzing: false,
        }
    }
}

/// Serializable view of a recording for the API and CLI.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSummary {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub cloud_status: CloudStatus,
    pub analyzing: bool,
    pub analysis: Option<String>,
    pub frames: usize,
    pub size_bytes: usize,
}

impl From<&Recording> for RecordingSummary {
    fn from(r: &Recording) -> Self {
        Self {
            id: r.id,
            timestamp: r.timestamp,
            cloud_status: r.cloud_status,
            analyzing: r.analyzing,
            analysis: r.analysis.clone(),
            frames: r.media.frame_count(),
            size_bytes: r.media.len(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No recording with id {0}")]
    NotFound(Uuid),
}

/// Cloneable handle to the recording collection.
#[derive(Clone)]
pub struct RecordingStore {
    recordings: Arc<Mutex<Vec<Recording>>>,
    cloud: Arc<dyn CloudSync>,
    analysis: Arc<dyn AnalysisService>,
    exports_dir: PathBuf,
}

impl RecordingStore {
    pub fn new(
        cloud: Arc<dyn CloudSync>,
        analysis: Arc<dyn AnalysisService>,
        exports_dir: PathBuf,
    ) -> Self {
        Self {
            recordings: Arc::new(Mutex::new(Vec::new())),
            cloud,
            analysis,
            exports_dir,
        }
    }

    /// Insert a finalized clip at the front (most-recent-first). When the
    /// capture-time auto-sync setting was on, the cloud save starts
    /// immediately in the background.
    pub async fn add(&self, media: MediaHandle, auto_sync: bool) -> Uuid {
        let recording = Recording::new(media);
        let id = recording.id;

        info!(
            "Recording {} stored: {} frames, {} bytes",
            id,
            recording.media.frame_count(),
            recording.media.len()
        );

        self.recordings.lock().await.insert(0, recording);

        if auto_sync {
            let store = self.clone();
            tokio::spawn(async move {
                if let Err(e) = store.save_to_drive(id).await {
                    error!("Auto-sync for recording {} failed: {}", id, e);
                }
            });
        }

        id
    }

    /// Most-recent-first summaries.
    pub async fn list(&self) -> Vec<RecordingSummary> {
        self.recordings
            .lock()
            .await
            .iter()
            .map(RecordingSummary::from)
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Option<RecordingSummary> {
        self.recordings
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .map(RecordingSummary::from)
    }

    /// Remove a recording. In-flight cloud/analysis operations for this id
    /// are not awaited; their results are discarded when they complete.
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut recordings = self.recordings.lock().await;
        let before = recordings.len();
        recordings.retain(|r| r.id != id);

        if recordings.len() == before {
            return Err(StoreError::NotFound(id));
        }

        info!("Recording {} deleted", id);
        Ok(())
    }

    /// Upload a recording. No-op when a save is already in flight or has
    /// already succeeded; a failed save may be retried by calling again.
    pub async fn save_to_drive(&self, id: Uuid) -> Result<(), StoreError> {
        // Flip the status inside the lock so racing calls produce exactly
        // one upload.
        let (media, timestamp) = {
            let mut recordings = self.recordings.lock().await;
            let recording = recordings
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(StoreError::NotFound(id))?;

            match recording.cloud_status {
                CloudStatus::Saving | CloudStatus::Saved => {
                    debug!(
                        "Recording {} is already {}, ignoring save request",
                        id,
                        recording.cloud_status.as_str()
                    );
                    return Ok(());
                }
                CloudStatus::Local | CloudStatus::Error => {}
            }

            recording.cloud_status = CloudStatus::Saving;
            (recording.media.clone(), recording.timestamp)
        };

        let result = self.cloud.save(&media).await;

        let mut recordings = self.recordings.lock().await;
        let Some(recording) = recordings.iter_mut().find(|r| r.id == id) else {
            debug!("Recording {} deleted during cloud save, discarding result", id);
            return Ok(());
        };

        match result {
            Ok(()) => {
                recording.cloud_status = CloudStatus::Saved;
                info!("Recording {} saved to cloud", id);
                if let Err(e) = cloud::export_clip(&self.exports_dir, timestamp, &media) {
                    warn!("Local export for recording {} failed: {}", id, e);
                }
            }
            Err(e) => {
                error!("Cloud save for recording {} failed: {}", id, e);
                recording.cloud_status = CloudStatus::Error;
            }
        }

        Ok(())
    }

    /// Analyze the representative still frame of a recording.
    ///
    /// At most one analysis per id is in flight at a time; a request while
    /// one is pending is ignored. After an attempt the analysis field always
    /// holds a value — the description, or error text — and no provider
    /// failure escapes this method.
    pub async fn analyze(&self, id: Uuid) -> Result<(), StoreError> {
        let still = {
            let mut recordings = self.recordings.lock().await;
            let recording = recordings
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(StoreError::NotFound(id))?;

            if recording.analyzing {
                debug!("Recording {} already being analyzed, ignoring request", id);
                return Ok(());
            }

            recording.analyzing = true;
            recording.media.middle_frame().map(|f| f.to_vec())
        };

        let outcome = match still {
            Some(frame) => self.analysis.analyze(&frame).await,
            None => Err(anyhow::anyhow!("Clip contains no frames to analyze")),
        };

        let text = match outcome {
            Ok(description) => description,
            Err(e) => {
                error!("Analysis for recording {} failed: {}", id, e);
                format!("Error: {e}")
            }
        };

        let mut recordings = self.recordings.lock().await;
        match recordings.iter_mut().find(|r| r.id == id) {
            Some(recording) => {
                recording.analysis = Some(text);
                recording.analyzing = false;
            }
            None => {
                debug!("Recording {} deleted during analysis, discarding result", id);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisService;
    use crate::cloud::CloudSync;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingCloud {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl CountingCloud {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
                delay: Duration::ZERO,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
                delay,
            })
        }
    }

    #[async_trait]
    impl CloudSync for CountingCloud {
        async fn save(&self, _media: &MediaHandle) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                anyhow::bail!("upload rejected");
            }
            Ok(())
        }
    }

    struct CountingAnalysis {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl CountingAnalysis {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
                delay: Duration::ZERO,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
                delay,
            })
        }
    }

    #[async_trait]
    impl AnalysisService for CountingAnalysis {
        async fn analyze(&self, _still: &[u8]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                anyhow::bail!("model unavailable");
            }
            Ok("A person walks through the frame".to_string())
        }
    }

    fn clip() -> MediaHandle {
        MediaHandle::new(vec![1, 2, 3, 4], vec![0, 2], "mjpeg")
    }

    fn store_with(
        cloud: Arc<CountingCloud>,
        analysis: Arc<CountingAnalysis>,
        dir: &std::path::Path,
    ) -> RecordingStore {
        RecordingStore::new(cloud, analysis, dir.to_path_buf())
    }

    #[tokio::test]
    async fn test_add_is_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(CountingCloud::new(false), CountingAnalysis::new(false), dir.path());

        let first = store.add(clip(), false).await;
        let second = store.add(clip(), false).await;

        let listed = store.list().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second);
        assert_eq!(listed[1].id, first);
        assert_eq!(listed[0].cloud_status, CloudStatus::Local);
    }

    #[tokio::test]
    async fn test_delete_removes_id_from_queries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(CountingCloud::new(false), CountingAnalysis::new(false), dir.path());

        let id = store.add(clip(), false).await;
        store.delete(id).await.unwrap();

        assert!(store.get(id).await.is_none());
        assert!(store.list().await.is_empty());
        assert!(matches!(
            store.delete(id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_success_exports_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = CountingCloud::new(false);
        let store = store_with(cloud.clone(), CountingAnalysis::new(false), dir.path());

        let id = store.add(clip(), false).await;
        store.save_to_drive(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().cloud_status, CloudStatus::Saved);

        // Saved is terminal: further requests do not hit the provider.
        store.save_to_drive(id).await.unwrap();
        assert_eq!(cloud.calls.load(Ordering::SeqCst), 1);

        let exported: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(exported.len(), 1);
        let name = exported[0].as_ref().unwrap().file_name();
        assert!(name.to_string_lossy().starts_with("security-event-"));
    }

    #[tokio::test]
    async fn test_save_failure_is_terminal_until_retried() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = CountingCloud::new(true);
        let store = store_with(cloud.clone(), CountingAnalysis::new(false), dir.path());

        let id = store.add(clip(), false).await;
        store.save_to_drive(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().cloud_status, CloudStatus::Error);
        assert_eq!(cloud.calls.load(Ordering::SeqCst), 1);

        // An explicit retry is allowed from Error.
        store.save_to_drive(id).await.unwrap();
        assert_eq!(cloud.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_saves_invoke_provider_once() {
        let dir = tempfile::tempdir().unwrap();
        // The upload stays in flight so the second request hits the
        // Saving guard rather than the terminal Saved state.
        let cloud = CountingCloud::slow(Duration::from_secs(1));
        let store = store_with(cloud.clone(), CountingAnalysis::new(false), dir.path());

        let id = store.add(clip(), false).await;
        let (a, b) = tokio::join!(store.save_to_drive(id), store.save_to_drive(id));
        a.unwrap();
        b.unwrap();

        assert_eq!(cloud.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get(id).await.unwrap().cloud_status, CloudStatus::Saved);
    }

    #[tokio::test]
    async fn test_auto_sync_saves_on_add() {
        let dir = tempfile::tempdir().unwrap();
        let cloud = CountingCloud::new(false);
        let store = store_with(cloud.clone(), CountingAnalysis::new(false), dir.path());

        let id = store.add(clip(), true).await;

        // The save runs on a spawned task; poll until it lands.
        for _ in 0..50 {
            if store.get(id).await.unwrap().cloud_status == CloudStatus::Saved {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(store.get(id).await.unwrap().cloud_status, CloudStatus::Saved);
        assert_eq!(cloud.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_analyze_sets_description() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = CountingAnalysis::new(false);
        let store = store_with(CountingCloud::new(false), analysis.clone(), dir.path());

        let id = store.add(clip(), false).await;
        store.analyze(id).await.unwrap();

        let summary = store.get(id).await.unwrap();
        assert_eq!(
            summary.analysis.as_deref(),
            Some("A person walks through the frame")
        );
        assert!(!summary.analyzing);
    }

    #[tokio::test]
    async fn test_analyze_failure_becomes_error_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(CountingCloud::new(false), CountingAnalysis::new(true), dir.path());

        let id = store.add(clip(), false).await;
        store.analyze(id).await.unwrap();

        let summary = store.get(id).await.unwrap();
        let text = summary.analysis.unwrap();
        assert!(text.starts_with("Error: "), "got: {text}");
        assert!(!summary.analyzing);
    }

    #[tokio::test]
    async fn test_analyze_empty_clip_becomes_error_text() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = CountingAnalysis::new(false);
        let store = store_with(CountingCloud::new(false), analysis.clone(), dir.path());

        let id = store
            .add(MediaHandle::new(Vec::new(), Vec::new(), "mjpeg"), false)
            .await;
        store.analyze(id).await.unwrap();

        let summary = store.get(id).await.unwrap();
        assert!(summary.analysis.unwrap().starts_with("Error: "));
        assert_eq!(analysis.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_analyses_invoke_provider_once() {
        let dir = tempfile::tempdir().unwrap();
        // The model call stays in flight so the requests overlap; once
        // the flag clears, a fresh analyze is a legitimate new request.
        let analysis = CountingAnalysis::slow(Duration::from_secs(1));
        let store = store_with(CountingCloud::new(false), analysis.clone(), dir.path());

        let id = store.add(clip(), false).await;
        let (a, b) = tokio::join!(store.analyze(id), store.analyze(id));
        a.unwrap();
        b.unwrap();

        assert_eq!(analysis.calls.load(Ordering::SeqCst), 1);
        assert!(!store.get(id).await.unwrap().analyzing);
    }

    #[tokio::test]
    async fn test_unknown_id_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(CountingCloud::new(false), CountingAnalysis::new(false), dir.path());

        let id = Uuid::new_v4();
        assert!(matches!(
            store.save_to_drive(id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.analyze(id).await, Err(StoreError::NotFound(_))));
    }
}
