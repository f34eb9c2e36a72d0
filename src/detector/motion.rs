//! Frame-difference motion scoring.

use anyhow::{bail, Result};
use tracing::debug;

use crate::media::Frame;

/// Every Nth pixel is sampled when diffing; bulk intensity change is what
/// we're after, not per-pixel accuracy.
const SAMPLE_STRIDE: usize = 4;

/// Scores consecutive frames by mean absolute intensity difference.
///
/// Keeps the previous frame internally, so it never triggers on the first
/// frame of a session. A dimension change mid-session is a backend fault
/// and degrades the detector rather than crashing the engine.
pub struct MotionDetector {
    threshold: f64,
    last_frame: Option<Frame>,
}

impl MotionDetector {
    pub fn new(sensitivity: u8) -> Self {
        Self {
            threshold: Self::threshold_for(sensitivity),
            last_frame: None,
        }
    }

    /// Higher sensitivity means a lower numeric threshold.
    pub fn threshold_for(sensitivity: u8) -> f64 {
        ((101 - sensitivity as i64) * 10_000) as f64
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Feed the next frame; returns the score when it exceeds the threshold.
    ///
    /// Errors only on a frame-dimension mismatch, which the caller treats
    /// as a detector runtime failure (the motion loop goes inactive).
    pub fn observe(&mut self, frame: Frame) -> Result<Option<f64>> {
        let triggered = match &self.last_frame {
            None => None,
            Some(last) => {
                if last.width != frame.width || last.height != frame.height {
                    bail!(
                        "Frame dimensions changed mid-session: {}x{} -> {}x{}",
                        last.width,
                        last.height,
                        frame.width,
                        frame.height
                    );
                }
                let score = Self::mean_difference(last, &frame);
                if score > self.threshold {
                    debug!("Motion score {:.0} over threshold {:.0}", score, self.threshold);
                    Some(score)
                } else {
                    None
                }
            }
        };

        self.last_frame = Some(frame);
        Ok(triggered)
    }

    /// Mean absolute intensity difference over the sampled pixels.
    fn mean_difference(a: &Frame, b: &Frame) -> f64 {
        let mut sum: u64 = 0;
        let mut count: u64 = 0;
        let mut i = 0;
        while i < a.pixels.len() {
            sum += a.pixels[i].abs_diff(b.pixels[i]) as u64;
            count += 1;
            i += SAMPLE_STRIDE;
        }
        if count == 0 {
            return 0.0;
        }
        sum as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(intensity: u32) -> Frame {
        Frame::filled(8, 8, intensity)
    }

    #[test]
    fn test_threshold_is_inverse_of_sensitivity() {
        assert_eq!(MotionDetector::threshold_for(1), 1_000_000.0);
        assert_eq!(MotionDetector::threshold_for(100), 10_000.0);

        let mut previous = f64::INFINITY;
        for sensitivity in 1..=100u8 {
            let threshold = MotionDetector::threshold_for(sensitivity);
            assert!(
                threshold < previous,
                "threshold must decrease as sensitivity rises"
            );
            previous = threshold;
        }
    }

    #[test]
    fn test_first_frame_never_triggers() {
        let mut detector = MotionDetector::new(100);
        assert!(detector.observe(frame(1_000_000)).unwrap().is_none());
    }

    #[test]
    fn test_identical_frames_never_trigger() {
        let mut detector = MotionDetector::new(100);
        for _ in 0..10 {
            assert!(detector.observe(frame(42)).unwrap().is_none());
        }
    }

    #[test]
    fn test_constant_delta_triggers_iff_over_threshold() {
        // sensitivity 20 -> threshold (101 - 20) * 10_000 = 810_000
        let mut detector = MotionDetector::new(20);
        detector.observe(frame(0)).unwrap();

        // Exactly at the threshold: strictly-greater comparison, no trigger.
        assert!(detector.observe(frame(810_000)).unwrap().is_none());

        let mut detector = MotionDetector::new(20);
        detector.observe(frame(0)).unwrap();
        let score = detector.observe(frame(810_001)).unwrap();
        assert_eq!(score, Some(810_001.0));
    }

    #[test]
    fn test_scenario_sensitivity_20_delta_900000() {
        let mut detector = MotionDetector::new(20);
        detector.observe(frame(0)).unwrap();
        let score = detector.observe(frame(900_000)).unwrap();
        assert_eq!(score, Some(900_000.0));
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let mut detector = MotionDetector::new(50);
        detector.observe(Frame::filled(8, 8, 0)).unwrap();
        assert!(detector.observe(Frame::filled(4, 4, 0)).is_err());
    }

    #[test]
    fn test_stride_sampling_sees_uniform_delta() {
        // A uniform delta scores the same regardless of stride.
        let a = Frame::filled(10, 10, 5);
        let b = Frame::filled(10, 10, 900_005);
        assert_eq!(MotionDetector::mean_difference(&a, &b), 900_000.0);
    }
}
