//! Immutable audio buffer passed between preprocessing stages.

use crate::audio::block::RawAudioBlock;

/// One audio buffer flowing through the preprocessing chain.
///
/// Every stage consumes one `AudioBuffer` and produces a new one; no stage
/// mutates its input. This keeps stages independently testable and safely
/// reorderable.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved float samples in [-1, 1].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count; 1 after the downmix stage.
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Buffer duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f32 / self.sample_rate as f32
        }
    }
}

impl From<&RawAudioBlock> for AudioBuffer {
    fn from(block: &RawAudioBlock) -> Self {
        Self::new(block.samples.clone(), block.sample_rate, block.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_mono() {
        let buf = AudioBuffer::mono(vec![0.0; 16000], 16000);
        assert_eq!(buf.frames(), 16000);
        assert!((buf.duration_secs() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_frames_stereo() {
        let buf = AudioBuffer::new(vec![0.0; 200], 100, 2);
        assert_eq!(buf.frames(), 100);
    }

    #[test]
    fn test_zero_channels_has_no_frames() {
        let buf = AudioBuffer::new(vec![0.0; 10], 100, 0);
        assert_eq!(buf.frames(), 0);
    }

    #[test]
    fn test_from_raw_block() {
        use std::time::Instant;
        let block = RawAudioBlock {
            samples: vec![0.1, 0.2],
            sample_rate: 16000,
            channels: 1,
            captured_at: Instant::now(),
            rms: 0.15,
        };
        let buf = AudioBuffer::from(&block);
        assert_eq!(buf.samples, vec![0.1, 0.2]);
        assert_eq!(buf.sample_rate, 16000);
        assert_eq!(buf.channels, 1);
    }
}
