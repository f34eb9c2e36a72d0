//! Bounded-duration recording sessions.
//!
//! A session is time-bounded, not content-bounded: it captures frames from
//! the shared latest-frame buffer until `started_at + planned_duration` and
//! then finalizes, whether or not motion/sound continued. The coordinator
//! owns the session task and aborts it if monitoring stops mid-window.

use image::ImageEncoder;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::media::{Frame, MediaHandle};

/// Latest frame from the sampler, shared with the motion loop and any
/// active session. Writers replace, readers clone; nobody mutates in place.
#[derive(Clone, Default)]
pub struct LatestFrame {
    inner: Arc<Mutex<Option<Frame>>>,
}

impl LatestFrame {
    pub fn set(&self, frame: Frame) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(frame);
        }
    }

    pub fn get(&self) -> Option<Frame> {
        self.inner.lock().ok().and_then(|slot| slot.clone())
    }
}

/// Accumulates JPEG-encoded frames into an MJPEG clip.
pub struct ClipEncoder {
    bytes: Vec<u8>,
    frame_offsets: Vec<usize>,
}

const JPEG_QUALITY: u8 = 80;

impl ClipEncoder {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            frame_offsets: Vec::new(),
        }
    }

    /// Append one frame. Encoding failures drop the frame with a warning
    /// rather than aborting the session.
    pub fn push(&mut self, frame: &Frame) {
        let luma: Vec<u8> = frame.pixels.iter().map(|&p| p.min(255) as u8).collect();

        let offset = self.bytes.len();
        let mut cursor = std::io::Cursor::new(&mut self.bytes);
        cursor.set_position(offset as u64);

        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        match encoder.write_image(
            &luma,
            frame.width,
            frame.height,
            image::ExtendedColorType::L8,
        ) {
            Ok(()) => self.frame_offsets.push(offset),
            Err(e) => {
                warn!("Dropping frame that failed to encode: {}", e);
                self.bytes.truncate(offset);
            }
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_offsets.len()
    }

    pub fn finish(self) -> MediaHandle {
        MediaHandle::new(self.bytes, self.frame_offsets, "mjpeg")
    }
}

impl Default for ClipEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture until the planned duration elapses, then finalize the clip.
///
/// A session that saw no frames still finalizes (empty clip) at its
/// deadline; duration is the only thing that ends a session.
pub async fn run(
    latest: LatestFrame,
    planned_duration: Duration,
    frame_interval: Duration,
) -> MediaHandle {
    let deadline = Instant::now() + planned_duration;
    let mut encoder = ClipEncoder::new();

    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let sleep = tokio::time::sleep_until(deadline);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => break,
            _ = ticker.tick() => {
                if let Some(frame) = latest.get() {
                    encoder.push(&frame);
                }
            }
        }
    }

    if encoder.frame_count() == 0 {
        debug!("Session finalized with no captured frames");
    }

    let media = encoder.finish();
    info!(
        "Recording session finalized: {} frames, {} bytes",
        media.frame_count(),
        media.len()
    );
    media
}
