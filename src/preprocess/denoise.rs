//! Stationary-noise spectral subtraction.
//!
//! Assumes the background noise profile is stable across the buffer: the
//! magnitude spectrum of the quietest frames is taken as the noise estimate
//! and a fixed proportion of it is subtracted from every frame, with a
//! spectral floor to avoid musical-noise artifacts.

use crate::error::{MedscribeError, Result};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

const FRAME_SIZE: usize = 512;
const HOP_SIZE: usize = 128;
/// Fraction of the quietest frames used for the noise profile.
const NOISE_FRAME_FRACTION: f32 = 0.1;
/// Minimum retained fraction of each bin's magnitude.
const SPECTRAL_FLOOR: f32 = 0.1;

/// Subtract `suppression` × the stationary noise profile from every frame.
///
/// Buffers shorter than one analysis frame are returned unchanged; there is
/// nothing to estimate noise from.
pub fn reduce_noise(samples: &[f32], suppression: f32) -> Result<Vec<f32>> {
    if !(0.0..=1.0).contains(&suppression) {
        return Err(MedscribeError::Preprocess {
            stage: "denoise",
            message: format!("suppression {} outside [0, 1]", suppression),
        });
    }
    if samples.len() < FRAME_SIZE {
        return Ok(samples.to_vec());
    }

    let window = hann_window(FRAME_SIZE);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FRAME_SIZE);
    let ifft = planner.plan_fft_inverse(FRAME_SIZE);

    // Forward STFT
    let frame_count = (samples.len() - FRAME_SIZE) / HOP_SIZE + 1;
    let mut spectra: Vec<Vec<Complex<f32>>> = Vec::with_capacity(frame_count);
    for i in 0..frame_count {
        let start = i * HOP_SIZE;
        let mut frame: Vec<Complex<f32>> = samples[start..start + FRAME_SIZE]
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut frame);
        spectra.push(frame);
    }

    // Noise profile: mean magnitude spectrum of the quietest frames
    let mut energies: Vec<(usize, f32)> = spectra
        .iter()
        .enumerate()
        .map(|(i, frame)| (i, frame.iter().map(|c| c.norm_sqr()).sum::<f32>()))
        .collect();
    energies.sort_by(|a, b| a.1.total_cmp(&b.1));
    let noise_frames = ((frame_count as f32 * NOISE_FRAME_FRACTION).ceil() as usize).max(1);

    let mut noise_profile = vec![0.0f32; FRAME_SIZE];
    for &(idx, _) in energies.iter().take(noise_frames) {
        for (bin, c) in spectra[idx].iter().enumerate() {
            noise_profile[bin] += c.norm();
        }
    }
    for value in &mut noise_profile {
        *value /= noise_frames as f32;
    }

    // Subtract and resynthesize by overlap-add
    let mut output = vec![0.0f32; samples.len()];
    let mut window_sum = vec![0.0f32; samples.len()];

    for (i, mut frame) in spectra.into_iter().enumerate() {
        for (bin, c) in frame.iter_mut().enumerate() {
            let magnitude = c.norm();
            if magnitude > 0.0 {
                let cleaned =
                    (magnitude - suppression * noise_profile[bin]).max(SPECTRAL_FLOOR * magnitude);
                *c *= cleaned / magnitude;
            }
        }
        ifft.process(&mut frame);

        let start = i * HOP_SIZE;
        for (j, c) in frame.iter().enumerate() {
            // rustfft's inverse is unnormalized
            output[start + j] += c.re / FRAME_SIZE as f32 * window[j];
            window_sum[start + j] += window[j] * window[j];
        }
    }

    for (i, (out, ws)) in output.iter_mut().zip(window_sum.iter()).enumerate() {
        if *ws > 1e-6 {
            *out /= *ws;
        } else {
            // Past the last full analysis frame (and at the very edges of the
            // Hann window) there is no coverage; pass the raw samples through
            // rather than truncating to silence
            *out = samples[i];
        }
    }

    Ok(output)
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}
