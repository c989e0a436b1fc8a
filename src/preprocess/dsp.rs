//! Signal-processing primitives for the preprocessing chain.
//!
//! Band filters are RBJ biquads (constant 0 dB peak band-pass); the chain
//! applies them causally for the EQ boost and zero-phase (forward/backward)
//! for the final speech band-pass so segment timing is not delayed.

/// Simple linear interpolation resampling of one channel.
pub fn resample_channel(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let idx = src_pos as usize;
            let frac = (src_pos - idx as f64) as f32;

            let a = samples[idx.min(samples.len() - 1)];
            let b = samples[(idx + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

/// Mix interleaved multi-channel samples down to mono by averaging frames.
pub fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Apply gain so the buffer reaches the target loudness, hard-clipped to
/// [-1, 1] to prevent overflow distortion.
pub fn normalize_volume(samples: &[f32], target_db: f32) -> Vec<f32> {
    let rms = crate::audio::block::calculate_rms(samples);
    let target_rms = 10f32.powf(target_db / 20.0);
    let gain = target_rms / (rms + 1e-6);

    samples
        .iter()
        .map(|&s| (s * gain).clamp(-1.0, 1.0))
        .collect()
}

/// Second-order IIR band-pass section (RBJ cookbook, constant 0 dB peak gain).
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Biquad {
    /// Band-pass centered on `center_hz` with quality factor `q`.
    pub fn bandpass(center_hz: f32, q: f32, sample_rate: u32) -> Self {
        let w0 = 2.0 * std::f32::consts::PI * center_hz / sample_rate as f32;
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;

        Self {
            b0: alpha / a0,
            b1: 0.0,
            b2: -alpha / a0,
            a1: -2.0 * w0.cos() / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Causal filtering (direct form I), fresh state per call.
    pub fn filter(&self, input: &[f32]) -> Vec<f32> {
        let mut x1 = 0.0f32;
        let mut x2 = 0.0f32;
        let mut y1 = 0.0f32;
        let mut y2 = 0.0f32;

        input
            .iter()
            .map(|&x| {
                let y = self.b0 * x + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
                x2 = x1;
                x1 = x;
                y2 = y1;
                y1 = y;
                y
            })
            .collect()
    }

    /// Zero-phase filtering: forward pass, then backward pass.
    ///
    /// Doubles the effective filter order and cancels the group delay that a
    /// causal pass would introduce, so segment timing stays aligned.
    pub fn filtfilt(&self, input: &[f32]) -> Vec<f32> {
        let forward = self.filter(input);
        let mut reversed: Vec<f32> = forward.into_iter().rev().collect();
        reversed = self.filter(&reversed);
        reversed.reverse();
        reversed
    }
}

/// Selective boost of speech intelligibility bands.
///
/// For each band, a band-pass copy of the signal is scaled by
/// `10^(gain/20) - 1` and added back: a boost-only comb rather than a full
/// parametric EQ.
pub fn speech_eq(samples: &[f32], sample_rate: u32, bands_hz: &[f32], gains_db: &[f32]) -> Vec<f32> {
    let mut out = samples.to_vec();

    for (&freq, &gain) in bands_hz.iter().zip(gains_db.iter()) {
        let biquad = Biquad::bandpass(freq, 1.0, sample_rate);
        let filtered = biquad.filter(samples);
        let scale = 10f32.powf(gain / 20.0) - 1.0;
        for (o, f) in out.iter_mut().zip(filtered.iter()) {
            *o += f * scale;
        }
    }

    out
}

/// Soft dynamic range compression above a fixed threshold, sign-preserving.
pub fn compress(samples: &[f32], threshold: f32, ratio: f32) -> Vec<f32> {
    samples
        .iter()
        .map(|&s| {
            let magnitude = s.abs();
            if magnitude > threshold {
                (threshold + (magnitude - threshold) / ratio) * s.signum()
            } else {
                s
            }
        })
        .collect()
}

/// First-order difference filter applied to the time-reversed signal.
///
/// Approximates removing decaying echo tails without a room impulse response.
pub fn dereverb(samples: &[f32], decay: f32) -> Vec<f32> {
    let reversed: Vec<f32> = samples.iter().rev().copied().collect();

    let mut filtered = Vec::with_capacity(reversed.len());
    let mut prev = 0.0f32;
    for &x in &reversed {
        filtered.push(x - decay * prev);
        prev = x;
    }

    filtered.reverse();
    filtered
}

/// Zero-phase 300–3400 Hz style band-pass built from two cascaded biquads.
pub fn bandpass(samples: &[f32], low_hz: f32, high_hz: f32, sample_rate: u32) -> Vec<f32> {
    let center = (low_hz * high_hz).sqrt();
    let q = center / (high_hz - low_hz);
    let biquad = Biquad::bandpass(center, q, sample_rate);

    let once = biquad.filtfilt(samples);
    biquad.filtfilt(&once)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::block::calculate_rms;

    fn sine(freq: f32, sample_rate: u32, secs: f32, amplitude: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * secs) as usize;
        (0..n)
            .map(|i| {
                amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    #[test]
    fn test_resample_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_channel(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_halves_length() {
        let samples = vec![0.5f32; 1000];
        let out = resample_channel(&samples, 32000, 16000);
        assert_eq!(out.len(), 500);
    }

    #[test]
    fn test_resample_doubles_length() {
        let samples = vec![0.5f32; 500];
        let out = resample_channel(&samples, 8000, 16000);
        assert_eq!(out.len(), 1000);
    }

    #[test]
    fn test_downmix_stereo_averages() {
        let samples = vec![1.0, 0.0, 0.5, 0.5];
        assert_eq!(downmix(&samples, 2), vec![0.5, 0.5]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let samples = vec![0.1, 0.2];
        assert_eq!(downmix(&samples, 1), samples);
    }

    #[test]
    fn test_normalize_reaches_target_loudness() {
        let quiet = sine(440.0, 16000, 0.5, 0.01);
        let out = normalize_volume(&quiet, -25.0);
        let target_rms = 10f32.powf(-25.0 / 20.0);
        let rms = calculate_rms(&out);
        assert!(
            (rms - target_rms).abs() / target_rms < 0.05,
            "RMS {} should be near target {}",
            rms,
            target_rms
        );
    }

    #[test]
    fn test_normalize_clips_to_unit_range() {
        let loud = vec![0.9f32, -0.9, 0.9, -0.9];
        let out = normalize_volume(&loud, 6.0);
        assert!(out.iter().all(|&s| (-1.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_bandpass_passes_in_band_rejects_out_of_band() {
        let in_band = sine(1000.0, 16000, 0.5, 0.5);
        let out_of_band = sine(60.0, 16000, 0.5, 0.5);

        let kept = bandpass(&in_band, 300.0, 3400.0, 16000);
        let rejected = bandpass(&out_of_band, 300.0, 3400.0, 16000);

        let kept_rms = calculate_rms(&kept);
        let rejected_rms = calculate_rms(&rejected);
        assert!(
            kept_rms > rejected_rms * 4.0,
            "in-band RMS {} should dominate out-of-band RMS {}",
            kept_rms,
            rejected_rms
        );
    }

    #[test]
    fn test_bandpass_preserves_length() {
        let samples = sine(1000.0, 16000, 0.25, 0.5);
        assert_eq!(bandpass(&samples, 300.0, 3400.0, 16000).len(), samples.len());
    }

    #[test]
    fn test_compress_below_threshold_unchanged() {
        let samples = vec![0.1, -0.2, 0.29];
        assert_eq!(compress(&samples, 0.3, 2.0), samples);
    }

    #[test]
    fn test_compress_above_threshold_attenuates() {
        let out = compress(&[0.9], 0.3, 2.0);
        assert!((out[0] - 0.6).abs() < 1e-6, "0.3 + 0.6/2 = 0.6, got {}", out[0]);
    }

    #[test]
    fn test_compress_preserves_sign() {
        let out = compress(&[-0.9], 0.3, 2.0);
        assert!((out[0] + 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_dereverb_preserves_length_and_is_finite() {
        let samples = sine(500.0, 16000, 0.25, 0.5);
        let out = dereverb(&samples, 0.6);
        assert_eq!(out.len(), samples.len());
        assert!(out.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_dereverb_on_impulse() {
        // Reversed impulse response of 1 - 0.6z^-1: the echo before the
        // impulse (in reversed time) is attenuated.
        let samples = vec![0.0, 0.0, 1.0, 0.0, 0.0];
        let out = dereverb(&samples, 0.6);
        assert!((out[2] - 1.0).abs() < 1e-6);
        assert!((out[1] + 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_speech_eq_boosts_high_band() {
        let high = sine(4000.0, 16000, 0.5, 0.1);
        let boosted = speech_eq(&high, 16000, &[4000.0], &[4.0]);
        assert!(calculate_rms(&boosted) > calculate_rms(&high));
    }

    #[test]
    fn test_speech_eq_cuts_low_band() {
        let low = sine(100.0, 16000, 0.5, 0.1);
        let cut = speech_eq(&low, 16000, &[100.0], &[-2.0]);
        assert!(calculate_rms(&cut) < calculate_rms(&low));
    }

    #[test]
    fn test_speech_eq_zero_gain_is_near_identity() {
        let samples = sine(500.0, 16000, 0.25, 0.1);
        let out = speech_eq(&samples, 16000, &[500.0], &[0.0]);
        for (a, b) in samples.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_filtfilt_output_finite() {
        let samples = sine(1000.0, 16000, 0.1, 0.5);
        let biquad = Biquad::bandpass(1000.0, 1.0, 16000);
        assert!(biquad.filtfilt(&samples).iter().all(|s| s.is_finite()));
    }
}
