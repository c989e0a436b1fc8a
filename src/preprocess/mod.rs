//! Deterministic speech-optimization pipeline applied before transcription.
//!
//! Stages run strictly in order; later stages assume the normalization done
//! by earlier ones. Preprocessing is best-effort: failure at any stage falls
//! back to the original, unmodified buffer rather than aborting; a segment
//! is never lost to a cleanup problem.

pub mod buffer;
pub mod denoise;
pub mod dsp;

pub use buffer::AudioBuffer;

use crate::config::PreprocessConfig;
use crate::defaults;
use crate::error::{MedscribeError, Result};

/// Ordered preprocessing chain producing a speech-optimized buffer.
pub struct PreprocessingChain {
    config: PreprocessConfig,
}

impl PreprocessingChain {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Run all stages. On any stage failure the original input buffer is
    /// returned unchanged; this method never fails.
    pub fn process(&self, input: &AudioBuffer) -> AudioBuffer {
        match self.run_stages(input) {
            Ok(output) => output,
            Err(e) => {
                eprintln!("[preprocess] {}, using unprocessed audio", e);
                input.clone()
            }
        }
    }

    fn run_stages(&self, input: &AudioBuffer) -> Result<AudioBuffer> {
        let resampled = resample(input, defaults::SAMPLE_RATE)?;
        let mono = to_mono(&resampled)?;

        let denoised = denoise::reduce_noise(&mono.samples, self.config.noise_suppression)?;
        let normalized = dsp::normalize_volume(&denoised, self.config.target_db);
        let equalized = dsp::speech_eq(
            &normalized,
            mono.sample_rate,
            &defaults::EQ_BANDS_HZ,
            &defaults::EQ_GAINS_DB,
        );
        let compressed = dsp::compress(
            &equalized,
            self.config.compression_threshold,
            self.config.compression_ratio,
        );
        let dereverbed = dsp::dereverb(&compressed, self.config.reverb_decay);
        let filtered = dsp::bandpass(
            &dereverbed,
            self.config.bandpass_low_hz,
            self.config.bandpass_high_hz,
            mono.sample_rate,
        );

        Ok(AudioBuffer::mono(filtered, mono.sample_rate))
    }
}

/// Stage 1: resample every channel to the target rate.
fn resample(input: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    if input.samples.is_empty() || input.channels == 0 || input.sample_rate == 0 {
        return Err(MedscribeError::Preprocess {
            stage: "resample",
            message: format!(
                "degenerate buffer ({} samples, {} channels, {} Hz)",
                input.samples.len(),
                input.channels,
                input.sample_rate
            ),
        });
    }
    if input.sample_rate == target_rate {
        return Ok(input.clone());
    }

    let channels = input.channels as usize;
    if channels == 1 {
        let samples = dsp::resample_channel(&input.samples, input.sample_rate, target_rate);
        return Ok(AudioBuffer::mono(samples, target_rate));
    }

    // Deinterleave, resample each channel, reinterleave
    let per_channel: Vec<Vec<f32>> = (0..channels)
        .map(|ch| {
            let channel: Vec<f32> = input.samples.iter().skip(ch).step_by(channels).copied().collect();
            dsp::resample_channel(&channel, input.sample_rate, target_rate)
        })
        .collect();

    let frames = per_channel.iter().map(|c| c.len()).min().unwrap_or(0);
    let mut interleaved = Vec::with_capacity(frames * channels);
    for frame in 0..frames {
        for channel in &per_channel {
            interleaved.push(channel[frame]);
        }
    }

    Ok(AudioBuffer::new(interleaved, target_rate, input.channels))
}

/// Stage 2: downmix to mono.
fn to_mono(input: &AudioBuffer) -> Result<AudioBuffer> {
    if input.channels == 0 {
        return Err(MedscribeError::Preprocess {
            stage: "downmix",
            message: "zero channels".to_string(),
        });
    }
    if input.channels == 1 {
        return Ok(input.clone());
    }
    let samples = dsp::downmix(&input.samples, input.channels as usize);
    Ok(AudioBuffer::mono(samples, input.sample_rate))
}
