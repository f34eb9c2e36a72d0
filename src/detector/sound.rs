//! RMS energy scoring for audio blocks.

use tracing::debug;

use crate::media::AudioBlock;

/// Scores each block by RMS amplitude and compares it directly against the
/// 1..=100 sensitivity value. Stateless: blocks are independent.
pub struct SoundDetector {
    threshold: f64,
}

impl SoundDetector {
    pub fn new(sensitivity: u8) -> Self {
        Self {
            threshold: sensitivity as f64,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the RMS score when it exceeds the threshold. Empty blocks
    /// score nothing.
    pub fn observe(&self, block: &AudioBlock) -> Option<f64> {
        if block.is_empty() {
            return None;
        }

        let score = Self::rms(&block.samples);
        if score > self.threshold {
            debug!("Sound score {:.1} over threshold {:.0}", score, self.threshold);
            Some(score)
        } else {
            None
        }
    }

    fn rms(samples: &[f32]) -> f64 {
        let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum / samples.len() as f64).sqrt()
    }
}
