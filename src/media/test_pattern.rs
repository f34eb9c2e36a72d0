//! Synthetic video source.
//!
//! Produces a slowly drifting gradient so the service runs end-to-end on
//! machines without a camera backend. The drift is gentle enough that it
//! stays far below any reachable motion threshold.

use anyhow::Result;

use super::source::VideoSource;
use super::Frame;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;

pub struct TestPatternSource {
    tick: u32,
    stopped: bool,
}

impl TestPatternSource {
    pub fn new() -> Self {
        Self {
            tick: 0,
            stopped: false,
        }
    }
}

impl Default for TestPatternSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSource for TestPatternSource {
    fn grab_frame(&mut self) -> Result<Option<Frame>> {
        if self.stopped {
            return Ok(None);
        }

        let phase = self.tick;
        self.tick = self.tick.wrapping_add(1);

        let pixels = (0..WIDTH * HEIGHT)
            .map(|i| (i % WIDTH + phase) % 256)
            .collect();

        Ok(Some(Frame::new(WIDTH, HEIGHT, pixels)))
    }

    fn dimensions(&self) -> (u32, u32) {
        (WIDTH, HEIGHT)
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
