//! medscribe - bilingual Darija/French medical-consultation transcription.
//!
//! The pipeline captures 5-second speech blocks (or accepts uploaded files),
//! cleans them through a deterministic preprocessing chain, transcribes both
//! language tracks with retry/timeout/fallback, fuses them into one French
//! sentence, consolidates a session into a transcript, and renders a
//! structured medical report.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

pub mod asr;
pub mod audio;
pub mod config;
pub mod defaults;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod preprocess;
pub mod text;

pub use asr::{
    LanguageTrack, RecognitionEngine, RecognitionFailure, SegmentResult, SessionContext,
    TranscriptionOrchestrator,
};
pub use audio::{BlockAssembler, CaptureStatus, GateDecision, RawAudioBlock};
#[cfg(feature = "capture")]
pub use audio::AudioCapture;
pub use config::Config;
pub use error::{MedscribeError, Result};
pub use format::{FormatNormalizer, NormalizedAudio};
pub use pipeline::Pipeline;
pub use preprocess::{AudioBuffer, PreprocessingChain};
pub use text::{ConsolidationEngine, FusionEngine, MedicalReport, ReportGenerator, TextGenerator};
