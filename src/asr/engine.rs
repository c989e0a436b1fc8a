//! Recognition engine abstraction.
//!
//! Engines are pluggable behind a trait so the orchestrator can retry,
//! time out and fall back without knowing which service is behind a call.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use crate::format::NormalizedAudio;

/// One of the two language tracks recognized for every segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageTrack {
    Darija,
    French,
}

impl LanguageTrack {
    /// Two-letter language code used by Whisper-style services.
    pub fn short_code(&self) -> &'static str {
        match self {
            LanguageTrack::Darija => "ar",
            LanguageTrack::French => "fr",
        }
    }
}

impl fmt::Display for LanguageTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageTrack::Darija => write!(f, "darija"),
            LanguageTrack::French => write!(f, "french"),
        }
    }
}

/// Why one recognition attempt produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionFailure {
    /// The engine ran but understood nothing.
    Unrecognized,
    /// The service answered with an error or was unreachable.
    ServiceError(String),
    /// The engine did not answer within the deadline.
    Timeout,
}

impl fmt::Display for RecognitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionFailure::Unrecognized => write!(f, "nothing recognized"),
            RecognitionFailure::ServiceError(message) => write!(f, "service error: {}", message),
            RecognitionFailure::Timeout => write!(f, "timed out"),
        }
    }
}

/// A speech-recognition backend for one audio segment.
///
/// Implementations block; the orchestrator supplies the timeout by running
/// the call on a worker thread.
pub trait RecognitionEngine: Send + Sync {
    /// Engine name used in diagnostics.
    fn name(&self) -> &str;

    /// Transcribe the segment in the given locale (e.g. "ar-MA", "fr-FR").
    fn transcribe(
        &self,
        audio: &NormalizedAudio,
        locale: &str,
    ) -> std::result::Result<String, RecognitionFailure>;
}

/// Record of one engine call, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct TranscriptionAttempt {
    pub engine: String,
    pub track: LanguageTrack,
    pub attempt: u32,
    pub outcome: std::result::Result<usize, RecognitionFailure>,
}

/// Scripted engine for tests: pops one outcome per call, records the
/// locales it was asked for, and can stall to exercise the timeout path.
pub struct MockEngine {
    name: String,
    outcomes: Mutex<VecDeque<std::result::Result<String, RecognitionFailure>>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockEngine {
    pub fn new(
        name: &str,
        outcomes: Vec<std::result::Result<String, RecognitionFailure>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Make every call sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Locales passed to `transcribe`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl RecognitionEngine for MockEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn transcribe(
        &self,
        _audio: &NormalizedAudio,
        locale: &str,
    ) -> std::result::Result<String, RecognitionFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(locale.to_string());
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        match self.outcomes.lock() {
            Ok(mut outcomes) => outcomes
                .pop_front()
                .unwrap_or(Err(RecognitionFailure::Unrecognized)),
            Err(_) => Err(RecognitionFailure::ServiceError("poisoned".to_string())),
        }
    }
}
