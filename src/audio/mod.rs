//! Audio capture: block assembly, silence gating and the CPAL stream.

pub mod block;
#[cfg(feature = "capture")]
pub mod capture;

pub use block::{calculate_rms, BlockAssembler, CaptureStatus, GateDecision, RawAudioBlock};
#[cfg(feature = "capture")]
pub use capture::AudioCapture;
