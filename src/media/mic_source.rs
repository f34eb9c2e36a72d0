//! Microphone capture via cpal.
//!
//! The `cpal::Stream` is not `Send`, so a dedicated capture thread owns it
//! for the lifetime of the source; samples accumulate in a shared buffer
//! that `grab_block` drains. The source itself can then move into the
//! audio sampler task.

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, error, info};

use super::source::AudioSource;
use super::AudioBlock;

/// Scale factor mapping cpal's -1.0..1.0 samples onto the 8-bit-like
/// amplitude range the sound sensitivity dial is calibrated against.
const AMPLITUDE_SCALE: f32 = 255.0;

pub struct MicSource {
    samples: Arc<Mutex<Vec<f32>>>,
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    sample_rate: u32,
}

impl MicSource {
    /// Acquire the default input device and start capturing.
    ///
    /// Errors here mean the microphone could not be accessed and are
    /// surfaced to the caller without retry.
    pub fn open() -> Result<Self> {
        let samples: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, String>>();

        let samples_clone = samples.clone();
        let thread = std::thread::spawn(move || {
            let outcome = Self::run_stream(samples_clone, stop_rx, ready_tx.clone());
            if let Err(e) = outcome {
                // Only reached when setup fails before the ready signal.
                let _ = ready_tx.send(Err(e.to_string()));
            }
        });

        let sample_rate = ready_rx
            .recv()
            .context("Microphone capture thread exited before reporting readiness")?
            .map_err(|e| anyhow!("Could not access microphone: {e}"))?;

        info!("Microphone capture started at {} Hz", sample_rate);

        Ok(Self {
            samples,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
            sample_rate,
        })
    }

    fn run_stream(
        samples: Arc<Mutex<Vec<f32>>>,
        stop_rx: mpsc::Receiver<()>,
        ready_tx: mpsc::Sender<Result<u32, String>>,
    ) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("No input device available")?;

        debug!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let config = device
            .default_input_config()
            .context("No default input config")?;
        let sample_rate = config.sample_rate().0;

        let err_fn = |err| error!("Microphone stream error: {}", err);
        let stream = device.build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = samples.lock() {
                    buf.extend(data.iter().map(|s| s * AMPLITUDE_SCALE));
                }
            },
            err_fn,
            None,
        )?;

        stream.play()?;
        let _ = ready_tx.send(Ok(sample_rate));

        // Park until stop is requested or the source is dropped.
        let _ = stop_rx.recv();
        drop(stream);
        debug!("Microphone capture thread exiting");
        Ok(())
    }
}

impl AudioSource for MicSource {
    fn grab_block(&mut self) -> Result<Option<AudioBlock>> {
        let mut buf = self
            .samples
            .lock()
            .map_err(|_| anyhow!("Microphone sample buffer poisoned"))?;

        if buf.is_empty() {
            return Ok(None);
        }

        Ok(Some(AudioBlock::new(std::mem::take(&mut *buf))))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        info!("Microphone capture stopped");
    }
}

impl Drop for MicSource {
    fn drop(&mut self) {
        if self.stop_tx.is_some() {
            debug!("Dropping active MicSource, cleaning up");
            self.stop();
        }
    }
}
