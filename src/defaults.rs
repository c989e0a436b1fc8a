//! Default configuration constants for medscribe.
//!
//! These are domain-tuned values carried over from field use; none were
//! derived analytically, so every one of them can be overridden in the
//! configuration file for a different microphone or room.

/// Audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and is the single normalized
/// format exchanged between the preprocessing chain, the format normalizer
/// and the transcription orchestrator.
pub const SAMPLE_RATE: u32 = 16_000;

/// Capture block duration in seconds.
///
/// Each delivered block holds 5 seconds of audio: long enough for one
/// consultation utterance, short enough to keep end-to-end latency tolerable.
pub const BLOCK_DURATION_SECS: u32 = 5;

/// RMS threshold below which a captured block is considered silence
/// and never enqueued for transcription.
pub const SILENCE_THRESHOLD: f32 = 0.008;

/// Scale factor mapping block RMS onto the 0–100 advisory level meter.
pub const LEVEL_SCALE: f32 = 5000.0;

/// Capacity of the bounded capture queue, in blocks.
///
/// At 5 s per block this buffers up to 80 s of ungated speech; beyond that
/// the newest block is dropped and the drop is reported through the status
/// record rather than letting memory grow.
pub const CAPTURE_QUEUE_CAPACITY: usize = 16;

/// Target loudness for volume normalization, in dBFS.
pub const TARGET_DB: f32 = -25.0;

/// Proportion of the stationary noise profile subtracted from each frame.
pub const NOISE_SUPPRESSION: f32 = 0.75;

/// Dynamic range compression threshold (absolute sample value).
pub const COMPRESSION_THRESHOLD: f32 = 0.3;

/// Dynamic range compression ratio above the threshold.
pub const COMPRESSION_RATIO: f32 = 2.0;

/// First-order de-reverberation decay coefficient.
pub const REVERB_DECAY: f32 = 0.6;

/// Speech equalizer band centers in Hz.
pub const EQ_BANDS_HZ: [f32; 4] = [100.0, 500.0, 2000.0, 4000.0];

/// Per-band gain offsets in dB, matching `EQ_BANDS_HZ`.
pub const EQ_GAINS_DB: [f32; 4] = [-2.0, 0.0, 3.0, 4.0];

/// Speech band-pass low cutoff in Hz (telephone-quality band).
pub const BANDPASS_LOW_HZ: f32 = 300.0;

/// Speech band-pass high cutoff in Hz.
pub const BANDPASS_HIGH_HZ: f32 = 3400.0;

/// Hard timeout for one recognition-engine call, in seconds.
pub const RECOGNITION_TIMEOUT_SECS: u64 = 10;

/// Retries after a failed primary-engine attempt (not counting the first try).
pub const RECOGNITION_MAX_RETRIES: u32 = 2;

/// Backoff between recognition retries, in milliseconds.
pub const RETRY_BACKOFF_MS: u64 = 500;

/// Locale for the Darija language track.
pub const DARIJA_LOCALE: &str = "ar-MA";

/// Locale for the French language track.
pub const FRENCH_LOCALE: &str = "fr-FR";

/// Timeout for one text-generation call, in seconds.
pub const GENERATION_TIMEOUT_SECS: u64 = 5;

/// Minimum uploaded-file size in bytes; anything smaller cannot hold speech.
pub const MIN_UPLOAD_BYTES: u64 = 1024;

/// Returns the number of samples in one capture block.
pub fn block_size(sample_rate: u32, block_duration_secs: u32) -> usize {
    (sample_rate * block_duration_secs) as usize
}
