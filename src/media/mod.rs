//! Media types and capture-source abstractions.
//!
//! The engine never touches a camera or microphone API directly; it pulls
//! frames and audio blocks through the [`VideoSource`] / [`AudioSource`]
//! traits, acquired via a [`MediaProvider`]. Acquisition failure is an
//! access denial and is surfaced to the caller verbatim.

pub mod mic_source;
pub mod source;
pub mod test_pattern;

pub use mic_source::MicSource;
pub use source::{AudioSource, LiveMediaProvider, MediaProvider, VideoSource};
pub use test_pattern::TestPatternSource;

use std::sync::Arc;

/// One captured video frame: a single intensity sample per pixel.
///
/// The intensity scale is defined by the capture backend and is opaque to
/// the engine; only differences between consecutive frames matter.
/// Dimensions are fixed for the lifetime of a monitoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Uniform frame, handy for tests and the synthetic source.
    pub fn filled(width: u32, height: u32, intensity: u32) -> Self {
        Self::new(width, height, vec![intensity; (width * height) as usize])
    }
}

/// A short block of signed amplitude samples pulled from the audio source.
///
/// Sample scale is backend-defined; the bundled mic source normalizes to an
/// 8-bit-like 0..255 amplitude range so the 1..=100 sensitivity dial lands
/// in a useful spot.
#[derive(Debug, Clone, Default)]
pub struct AudioBlock {
    pub samples: Vec<f32>,
}

impl AudioBlock {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A finalized clip: concatenated JPEG frames (MJPEG) plus the byte offset
/// of each frame so a representative still can be extracted later.
///
/// Cloning is cheap; the underlying bytes are shared and freed when the
/// last handle drops.
#[derive(Debug, Clone)]
pub struct MediaHandle {
    bytes: Arc<Vec<u8>>,
    frame_offsets: Vec<usize>,
    extension: &'static str,
}

impl MediaHandle {
    pub fn new(bytes: Vec<u8>, frame_offsets: Vec<usize>, extension: &'static str) -> Self {
        Self {
            bytes: Arc::new(bytes),
            frame_offsets,
            extension,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_offsets.len()
    }

    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// The middle frame of the clip, used as the representative still for
    /// analysis. None for an empty clip.
    pub fn middle_frame(&self) -> Option<&[u8]> {
        if self.frame_offsets.is_empty() {
            return None;
        }
        let idx = self.frame_offsets.len() / 2;
        let start = self.frame_offsets[idx];
        let end = self
            .frame_offsets
            .get(idx + 1)
            .copied()
            .unwrap_or(self.bytes.len());
        Some(&self.bytes[start..end])
    }
}
