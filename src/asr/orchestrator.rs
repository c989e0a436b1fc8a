//! Transcription orchestration: timeouts, retries, fallback and the
//! segment filter ladder.
//!
//! Per language track the primary engine gets a hard deadline on a worker
//! thread. `Unrecognized` and `ServiceError` are retried with backoff; a
//! `Timeout` skips retries and escalates to the fallback engine, which is
//! invoked at most once per track. A track that exhausts everything yields
//! empty text, never an error, so one bad segment cannot stop a session.

use std::sync::Arc;
use std::time::Duration;

use crate::asr::engine::{
    LanguageTrack, RecognitionEngine, RecognitionFailure, TranscriptionAttempt,
};
use crate::asr::session::{SegmentResult, SessionContext};
use crate::config::RecognitionConfig;
use crate::format::NormalizedAudio;
use crate::text::filters;
use crate::text::FusionEngine;

pub struct TranscriptionOrchestrator {
    primary: Arc<dyn RecognitionEngine>,
    fallback: Option<Arc<dyn RecognitionEngine>>,
    fusion: FusionEngine,
    config: RecognitionConfig,
    boilerplate_phrases: Vec<String>,
}

impl TranscriptionOrchestrator {
    pub fn new(
        primary: Arc<dyn RecognitionEngine>,
        fallback: Option<Arc<dyn RecognitionEngine>>,
        fusion: FusionEngine,
        config: RecognitionConfig,
        boilerplate_phrases: Vec<String>,
    ) -> Self {
        Self {
            primary,
            fallback,
            fusion,
            config,
            boilerplate_phrases,
        }
    }

    /// Transcribe one segment on both tracks, filter, fuse and number it.
    ///
    /// Returns an empty `SegmentResult` for anything discarded: silence,
    /// boilerplate, a duplicate of the previous accepted pair, or fusion
    /// producing nothing. The session fingerprint and id counter advance
    /// only on acceptance.
    pub fn transcribe_segment(
        &self,
        audio: &NormalizedAudio,
        session: &mut SessionContext,
    ) -> SegmentResult {
        if audio.is_empty() {
            return SegmentResult::empty();
        }

        let (darija, _) = self.transcribe_track(audio, LanguageTrack::Darija);
        let (french, _) = self.transcribe_track(audio, LanguageTrack::French);

        if darija.is_empty() && french.is_empty() {
            return SegmentResult::empty();
        }

        if filters::contains_boilerplate(&darija, &self.boilerplate_phrases)
            || filters::contains_boilerplate(&french, &self.boilerplate_phrases)
        {
            eprintln!("[asr] boilerplate detected, segment discarded");
            return SegmentResult::empty();
        }

        let fingerprint = SessionContext::fingerprint(&darija, &french);
        if session.is_duplicate(&fingerprint) {
            return SegmentResult::empty();
        }

        let fused = self.fusion.fuse(&darija, &french);
        if fused.is_empty() {
            return SegmentResult::empty();
        }

        let segment_id = session.accept(fingerprint);
        SegmentResult {
            darija,
            french,
            fused,
            segment_id: Some(segment_id),
        }
    }

    /// Run the retry/fallback ladder for one track.
    ///
    /// Returns trimmed text (possibly empty) and the attempt log.
    pub fn transcribe_track(
        &self,
        audio: &NormalizedAudio,
        track: LanguageTrack,
    ) -> (String, Vec<TranscriptionAttempt>) {
        let locale = match track {
            LanguageTrack::Darija => self.config.darija_locale.clone(),
            LanguageTrack::French => self.config.french_locale.clone(),
        };
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let backoff = Duration::from_millis(self.config.retry_backoff_ms);

        let mut attempts = Vec::new();
        let mut retries = 0u32;

        let primary_failure = loop {
            let outcome = call_with_timeout(&self.primary, audio, &locale, timeout);
            attempts.push(TranscriptionAttempt {
                engine: self.primary.name().to_string(),
                track,
                attempt: retries + 1,
                outcome: outcome.as_ref().map(|t| t.len()).map_err(|f| f.clone()),
            });

            match outcome {
                Ok(text) => return (text.trim().to_string(), attempts),
                Err(RecognitionFailure::Timeout) => {
                    // A stalled service will stall again; go straight to fallback
                    eprintln!("[asr] {} track: primary timed out", track);
                    break RecognitionFailure::Timeout;
                }
                Err(failure) => {
                    if retries < self.config.max_retries {
                        retries += 1;
                        std::thread::sleep(backoff);
                        continue;
                    }
                    break failure;
                }
            }
        };

        if let Some(fallback) = &self.fallback {
            eprintln!(
                "[asr] {} track: primary failed ({}), trying {}",
                track,
                primary_failure,
                fallback.name()
            );
            let outcome = call_with_timeout(fallback, audio, &locale, timeout);
            attempts.push(TranscriptionAttempt {
                engine: fallback.name().to_string(),
                track,
                attempt: 1,
                outcome: outcome.as_ref().map(|t| t.len()).map_err(|f| f.clone()),
            });
            if let Ok(text) = outcome {
                return (text.trim().to_string(), attempts);
            }
        }

        (String::new(), attempts)
    }
}

/// Run one engine call on a worker thread with a hard deadline.
///
/// On timeout the worker is abandoned; its eventual result is dropped with
/// the channel.
fn call_with_timeout(
    engine: &Arc<dyn RecognitionEngine>,
    audio: &NormalizedAudio,
    locale: &str,
    timeout: Duration,
) -> std::result::Result<String, RecognitionFailure> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let engine = Arc::clone(engine);
    let audio = audio.clone();
    let locale = locale.to_string();

    std::thread::spawn(move || {
        let _ = tx.send(engine.transcribe(&audio, &locale));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(RecognitionFailure::Timeout),
    }
}
