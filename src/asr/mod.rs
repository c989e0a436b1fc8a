//! Speech recognition: engine contracts, HTTP clients, session state and
//! the retry/fallback orchestrator.

pub mod engine;
pub mod http;
pub mod orchestrator;
pub mod session;

pub use engine::{
    LanguageTrack, MockEngine, RecognitionEngine, RecognitionFailure, TranscriptionAttempt,
};
pub use http::{HttpSpeechEngine, WhisperApiEngine};
pub use orchestrator::TranscriptionOrchestrator;
pub use session::{SegmentResult, SessionContext};
