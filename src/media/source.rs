//! Capture-source traits for video and audio inputs.

use anyhow::Result;

use super::{AudioBlock, Frame};

/// A live video input. Frames are pulled, not pushed: the frame sampler
/// polls `grab_frame` on its own cadence and keeps only the latest frame.
///
/// Sources are moved into the sampler task, so implementations must be
/// `Send`; backends built on `!Send` handles (cpal streams, GStreamer
/// pipelines) should own them on a dedicated thread.
pub trait VideoSource: Send {
    /// The most recent frame, or None if no new frame is available yet.
    fn grab_frame(&mut self) -> Result<Option<Frame>>;

    /// Fixed frame dimensions for this source.
    fn dimensions(&self) -> (u32, u32);

    /// Release the underlying device.
    fn stop(&mut self);
}

/// A live audio input producing blocks of amplitude samples.
pub trait AudioSource: Send {
    /// Samples captured since the previous grab, or None if nothing new.
    fn grab_block(&mut self) -> Result<Option<AudioBlock>>;

    fn sample_rate(&self) -> u32;

    /// Release the underlying device.
    fn stop(&mut self);
}

/// Acquires the camera and microphone for one monitoring session.
///
/// `open_*` maps to the permission prompt of the platform backend: an error
/// here is an access denial and is surfaced to the user verbatim, without
/// retry.
pub trait MediaProvider: Send + Sync {
    fn open_video(&self) -> Result<Box<dyn VideoSource>>;
    fn open_audio(&self) -> Result<Box<dyn AudioSource>>;
}

/// Default provider: synthetic test-pattern video plus the cpal microphone.
/// Real camera backends plug in behind [`VideoSource`].
pub struct LiveMediaProvider;

impl MediaProvider for LiveMediaProvider {
    fn open_video(&self) -> Result<Box<dyn VideoSource>> {
        Ok(Box::new(super::TestPatternSource::new()))
    }

    fn open_audio(&self) -> Result<Box<dyn AudioSource>> {
        Ok(Box::new(super::MicSource::open()?))
    }
}
