//! Monitoring lifecycle orchestrator.
//!
//! Runs the pipeline: samplers -> detectors -> trigger coordinator ->
//! recording session -> store. One machine drives one camera/microphone
//! pair; collaborators are injected via constructor.

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::MonitorSettings;
use crate::detector::{MotionDetector, SoundDetector, TriggerEvent, TriggerSource};
use crate::media::{AudioSource, MediaProvider, VideoSource};
use crate::store::RecordingStore;

use super::session::{self, LatestFrame};
use super::status::{MonitorPhase, MonitorStatusHandle};

/// Frame sampler cadence. Sessions capture at the same rate.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);
/// Motion detector cadence, independent of frame arrival.
const MOTION_INTERVAL: Duration = Duration::from_millis(500);
/// Audio sampler / sound detector cadence.
const SOUND_INTERVAL: Duration = Duration::from_millis(200);

/// Tasks and shutdown signal for one monitoring run.
struct MonitoringSession {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

pub struct MonitorMachine {
    provider: Arc<dyn MediaProvider>,
    store: RecordingStore,
    status: MonitorStatusHandle,
    active: Option<MonitoringSession>,
}

impl MonitorMachine {
    pub fn new(
        provider: Arc<dyn MediaProvider>,
        store: RecordingStore,
        status: MonitorStatusHandle,
    ) -> Self {
        Self {
            provider,
            store,
            status,
            active: None,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.active.is_some()
    }

    /// Start monitoring with a snapshot of the given settings.
    ///
    /// The snapshot is fixed for the whole run; settings changes only apply
    /// to the next start. Media acquisition failure is surfaced verbatim
    /// and nothing is left running.
    pub async fn start(&mut self, settings: MonitorSettings) -> Result<()> {
        if self.active.is_some() {
            bail!("Monitoring is already running. Stop it first.");
        }

        let settings = settings.clamped();

        self.status
            .set_phase(MonitorPhase::RequestingPermissions)
            .await;

        let video = match self.provider.open_video() {
            Ok(v) => v,
            Err(e) => {
                error!("Camera access failed: {}", e);
                self.status.set_error(e.to_string()).await;
                return Err(e);
            }
        };
        let audio = match self.provider.open_audio() {
            Ok(a) => a,
            Err(e) => {
                error!("Microphone access failed: {}", e);
                self.status.set_error(e.to_string()).await;
                return Err(e);
            }
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (trigger_tx, trigger_rx) = mpsc::channel::<TriggerEvent>(16);
        let latest = LatestFrame::default();

        let tasks = vec![
            tokio::spawn(frame_sampler(video, latest.clone(), shutdown_rx.clone())),
            tokio::spawn(motion_loop(
                MotionDetector::new(settings.motion_sensitivity),
                latest.clone(),
                trigger_tx.clone(),
                shutdown_rx.clone(),
            )),
            tokio::spawn(sound_loop(
                audio,
                SoundDetector::new(settings.sound_sensitivity),
                trigger_tx,
                shutdown_rx.clone(),
            )),
            tokio::spawn(coordinator(
                trigger_rx,
                latest,
                settings,
                self.store.clone(),
                self.status.clone(),
                shutdown_rx,
            )),
        ];

        self.status.begin_monitoring(settings).await;
        self.active = Some(MonitoringSession {
            shutdown: shutdown_tx,
            tasks,
        });

        info!(
            "Monitoring started (motion sensitivity {}, sound sensitivity {}, {}s recordings)",
            settings.motion_sensitivity, settings.sound_sensitivity, settings.recording_duration_secs
        );
        Ok(())
    }

    /// Stop monitoring: halt the sampler/detector loops, release the
    /// sources, and discard any recording session still in its window.
    /// In-flight cloud/analysis operations on stored recordings continue.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(session) = self.active.take() else {
            bail!("Monitoring is not running.");
        };

        let _ = session.shutdown.send(true);
        for task in session.tasks {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Monitor task ended abnormally: {}", e);
                }
            }
        }

        self.status.reset().await;
        info!("Monitoring stopped");
        Ok(())
    }
}

/// Pulls frames from the video source into the shared latest-frame buffer.
async fn frame_sampler(
    mut video: Box<dyn VideoSource>,
    latest: LatestFrame,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                match video.grab_frame() {
                    Ok(Some(frame)) => latest.set(frame),
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Video source failed, frame sampling disabled: {}", e);
                        break;
                    }
                }
            }
        }
    }

    video.stop();
}

/// Scores the two most recent frames on a fixed cadence and reports
/// triggers. A detector fault disables this loop without taking down the
/// rest of the engine.
async fn motion_loop(
    mut detector: MotionDetector,
    latest: LatestFrame,
    triggers: mpsc::Sender<TriggerEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(MOTION_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let Some(frame) = latest.get() else { continue };
                match detector.observe(frame) {
                    Ok(Some(score)) => {
                        let event = TriggerEvent::now(TriggerSource::Motion, score);
                        if triggers.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Motion detector disabled: {}", e);
                        break;
                    }
                }
            }
        }
    }
}

/// Pulls audio blocks and scores them on a fixed cadence, independent of
/// the motion loop.
async fn sound_loop(
    mut audio: Box<dyn AudioSource>,
    detector: SoundDetector,
    triggers: mpsc::Sender<TriggerEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(SOUND_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                match audio.grab_block() {
                    Ok(Some(block)) => {
                        if let Some(score) = detector.observe(&block) {
                            let event = TriggerEvent::now(TriggerSource::Sound, score);
                            if triggers.send(event).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Sound detector disabled: {}", e);
                        break;
                    }
                }
            }
        }
    }

    audio.stop();
}

/// Serializes trigger events into recording decisions.
///
/// The first qualifying trigger starts a session; every trigger that
/// arrives while it runs is swallowed, so one continuous episode produces
/// exactly one recording. The session always ends at its planned duration,
/// after which the coordinator is eligible to start the next one.
async fn coordinator(
    mut triggers: mpsc::Receiver<TriggerEvent>,
    latest: LatestFrame,
    settings: MonitorSettings,
    store: RecordingStore,
    status: MonitorStatusHandle,
    mut shutdown: watch::Receiver<bool>,
) {
    let planned_duration = Duration::from_secs(settings.recording_duration_secs as u64);

    'monitoring: loop {
        let event = tokio::select! {
            _ = shutdown.changed() => break,
            event = triggers.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        info!(
            "Trigger: {} (score {:.0}), recording for {:?}",
            event.source.as_str(),
            event.score,
            planned_duration
        );
        status.record_trigger(event.source).await;

        let mut session = tokio::spawn(session::run(
            latest.clone(),
            planned_duration,
            FRAME_INTERVAL,
        ));

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    // Monitoring stopped mid-window: the session is
                    // discarded without producing a recording.
                    session.abort();
                    break 'monitoring;
                }
                result = &mut session => {
                    match result {
                        Ok(media) => {
                            store.add(media, settings.auto_sync).await;
                        }
                        Err(e) => error!("Recording session task failed: {}", e),
                    }
                    break;
                }
                event = triggers.recv() => {
                    match event {
                        Some(event) => debug!(
                            "Trigger from {} swallowed, recording already active",
                            event.source.as_str()
                        ),
                        None => {
                            // Detector loops are gone. A fault lets the
                            // session run out, but a stop request (which
                            // closes the same senders) still discards it.
                            tokio::select! {
                                _ = shutdown.changed() => session.abort(),
                                result = &mut session => match result {
                                    Ok(media) => {
                                        store.add(media, settings.auto_sync).await;
                                    }
                                    Err(e) => error!("Recording session task failed: {}", e),
                                },
                            }
                            break 'monitoring;
                        }
                    }
                }
            }
        }

        status.set_phase(MonitorPhase::Monitoring).await;
    }
}
