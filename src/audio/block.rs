//! Captured audio blocks, RMS silence gating and capture status.
//!
//! The block assembler is pure: it can be driven sample-by-sample in tests
//! without any audio hardware.

use crate::defaults;
use std::time::Instant;

/// One fixed-duration block of captured audio.
///
/// Only blocks whose RMS exceeds the silence threshold are ever enqueued
/// for downstream processing.
#[derive(Debug, Clone)]
pub struct RawAudioBlock {
    /// Mono float samples in [-1, 1].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (always 1 for assembled blocks).
    pub channels: u16,
    /// Timestamp when the block was completed.
    pub captured_at: Instant,
    /// RMS energy computed over the whole block.
    pub rms: f32,
}

/// Advisory capture status, safe for concurrent reads while the capture
/// thread writes. Eventual consistency is acceptable.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureStatus {
    pub recording: bool,
    /// Normalized audio level, 0–100.
    pub audio_level: f32,
    pub status_message: String,
}

impl Default for CaptureStatus {
    fn default() -> Self {
        Self {
            recording: false,
            audio_level: 0.0,
            status_message: "Prêt".to_string(),
        }
    }
}

/// Calculates the Root Mean Square (RMS) of float audio samples.
///
/// Returns 0.0 for an empty slice; ~0.707 for a full-scale sine wave.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Map an RMS value onto the 0–100 advisory level meter.
pub fn audio_level(rms: f32) -> f32 {
    (rms * defaults::LEVEL_SCALE).min(100.0)
}

/// Accumulates the capture callback's sample stream into fixed-size blocks
/// and applies the silence gate.
pub struct BlockAssembler {
    pending: Vec<f32>,
    block_size: usize,
    sample_rate: u32,
    silence_threshold: f32,
}

/// Result of feeding samples: the completed block if one filled up, plus the
/// RMS/level of the most recently completed block for status reporting.
#[derive(Debug)]
pub enum GateDecision {
    /// Block completed and loud enough to keep.
    Speech(RawAudioBlock),
    /// Block completed but below the silence threshold; dropped.
    Silence { rms: f32 },
    /// Not enough samples yet for a complete block.
    Pending,
}

impl BlockAssembler {
    pub fn new(sample_rate: u32, block_duration_secs: u32, silence_threshold: f32) -> Self {
        Self {
            pending: Vec::new(),
            block_size: defaults::block_size(sample_rate, block_duration_secs),
            sample_rate,
            silence_threshold,
        }
    }

    /// Feed captured samples; returns one decision per call.
    ///
    /// The callback block size and the assembled block size are independent:
    /// cpal may deliver audio in arbitrary chunks. At most one block is
    /// completed per call when fed chunks no larger than the block size;
    /// surplus samples stay pending for the next block.
    pub fn push(&mut self, samples: &[f32]) -> GateDecision {
        self.pending.extend_from_slice(samples);

        if self.pending.len() < self.block_size {
            return GateDecision::Pending;
        }

        let rest = self.pending.split_off(self.block_size);
        let block_samples = std::mem::replace(&mut self.pending, rest);
        let rms = calculate_rms(&block_samples);

        if rms > self.silence_threshold {
            GateDecision::Speech(RawAudioBlock {
                samples: block_samples,
                sample_rate: self.sample_rate,
                channels: 1,
                captured_at: Instant::now(),
                rms,
            })
        } else {
            GateDecision::Silence { rms }
        }
    }

    /// Discard any partially assembled block.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler() -> BlockAssembler {
        // 1-second blocks at 100 Hz keep the tests small
        BlockAssembler::new(100, 1, defaults::SILENCE_THRESHOLD)
    }

    #[test]
    fn test_rms_silence_is_zero() {
        assert_eq!(calculate_rms(&vec![0.0; 1000]), 0.0);
    }

    #[test]
    fn test_rms_empty_is_zero() {
        assert_eq!(calculate_rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_full_scale() {
        let rms = calculate_rms(&vec![1.0f32; 1000]);
        assert!((rms - 1.0).abs() < 1e-6, "RMS should be ~1.0, got {}", rms);
    }

    #[test]
    fn test_rms_mixed_signs() {
        let mut samples = vec![0.5f32; 500];
        samples.extend(vec![-0.5f32; 500]);
        let rms = calculate_rms(&samples);
        assert!((rms - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_audio_level_clamped_to_100() {
        assert_eq!(audio_level(1.0), 100.0);
        assert!(audio_level(0.008) < 100.0);
    }

    #[test]
    fn test_incomplete_block_is_pending() {
        let mut asm = assembler();
        assert!(matches!(asm.push(&[0.5; 50]), GateDecision::Pending));
    }

    #[test]
    fn test_loud_block_passes_gate() {
        let mut asm = assembler();
        asm.push(&[0.5; 50]);
        match asm.push(&[0.5; 50]) {
            GateDecision::Speech(block) => {
                assert_eq!(block.samples.len(), 100);
                assert_eq!(block.sample_rate, 100);
                assert_eq!(block.channels, 1);
                assert!(block.rms > defaults::SILENCE_THRESHOLD);
            }
            other => panic!("Expected Speech, got {:?}", other),
        }
    }

    #[test]
    fn test_silent_block_never_passes_gate() {
        let mut asm = assembler();
        match asm.push(&vec![0.0001f32; 100]) {
            GateDecision::Silence { rms } => assert!(rms <= defaults::SILENCE_THRESHOLD),
            other => panic!("Expected Silence, got {:?}", other),
        }
    }

    #[test]
    fn test_surplus_samples_roll_into_next_block() {
        let mut asm = assembler();
        // 150 samples: one full block plus 50 pending
        match asm.push(&vec![0.5f32; 150]) {
            GateDecision::Speech(block) => assert_eq!(block.samples.len(), 100),
            other => panic!("Expected Speech, got {:?}", other),
        }
        // 50 more completes the second block
        assert!(matches!(
            asm.push(&vec![0.5f32; 50]),
            GateDecision::Speech(_)
        ));
    }

    #[test]
    fn test_reset_discards_pending() {
        let mut asm = assembler();
        asm.push(&[0.5; 99]);
        asm.reset();
        assert!(matches!(asm.push(&[0.5; 99]), GateDecision::Pending));
    }

    #[test]
    fn test_rms_exactly_at_threshold_is_silence() {
        let mut asm = BlockAssembler::new(100, 1, 0.5);
        match asm.push(&vec![0.5f32; 100]) {
            GateDecision::Silence { rms } => assert!((rms - 0.5).abs() < 1e-6),
            other => panic!("Expected Silence at exact threshold, got {:?}", other),
        }
    }

    #[test]
    fn test_default_status() {
        let status = CaptureStatus::default();
        assert!(!status.recording);
        assert_eq!(status.audio_level, 0.0);
        assert_eq!(status.status_message, "Prêt");
    }
}
