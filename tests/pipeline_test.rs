//! End-to-end behavior of the transcription pipeline with scripted engines.

use std::sync::Arc;
use std::time::Duration;

use medscribe::asr::{
    LanguageTrack, MockEngine, RecognitionEngine, RecognitionFailure, SessionContext,
    TranscriptionOrchestrator,
};
use medscribe::config::{FilterConfig, PreprocessConfig, RecognitionConfig};
use medscribe::text::{
    ConsolidationEngine, FusionEngine, MockGenerator, ReportGenerator, TextGenerator,
};
use medscribe::{
    AudioBuffer, BlockAssembler, GateDecision, NormalizedAudio, PreprocessingChain, SegmentResult,
};

fn audio() -> NormalizedAudio {
    NormalizedAudio::from_f32(&[0.1; 1600])
}

fn recognition_config() -> RecognitionConfig {
    RecognitionConfig {
        timeout_secs: 1,
        retry_backoff_ms: 1,
        ..RecognitionConfig::default()
    }
}

fn orchestrator_with(
    primary: Arc<MockEngine>,
    fallback: Option<Arc<MockEngine>>,
    generator: Arc<MockGenerator>,
) -> TranscriptionOrchestrator {
    let filters = FilterConfig::default();
    let fusion = FusionEngine::new(
        Arc::clone(&generator) as Arc<dyn TextGenerator>,
        filters.fused_reject_phrases,
    );
    TranscriptionOrchestrator::new(
        primary as Arc<dyn RecognitionEngine>,
        fallback.map(|f| f as Arc<dyn RecognitionEngine>),
        fusion,
        recognition_config(),
        filters.boilerplate_phrases,
    )
}

/// One failed darija track (initial try plus two retries) followed by a
/// French result, so fusion takes the single-track path.
fn french_only(text: &str) -> Vec<Result<String, RecognitionFailure>> {
    vec![
        Err(RecognitionFailure::Unrecognized),
        Err(RecognitionFailure::Unrecognized),
        Err(RecognitionFailure::Unrecognized),
        Ok(text.to_string()),
    ]
}

#[test]
fn silence_gated_blocks_never_reach_the_queue() {
    let mut assembler = BlockAssembler::new(16000, 1, 0.008);

    match assembler.push(&vec![0.0005f32; 16000]) {
        GateDecision::Silence { rms } => assert!(rms <= 0.008),
        other => panic!("quiet block should be gated, got {:?}", other),
    }
    match assembler.push(&vec![0.2f32; 16000]) {
        GateDecision::Speech(block) => assert_eq!(block.samples.len(), 16000),
        other => panic!("loud block should pass, got {:?}", other),
    }
}

#[test]
fn preprocessing_failure_returns_the_original_buffer() {
    let chain = PreprocessingChain::new(PreprocessConfig::default());
    let degenerate = AudioBuffer::mono(vec![], 16000);
    assert_eq!(chain.process(&degenerate), degenerate);

    let zero_rate = AudioBuffer::mono(vec![0.4; 64], 0);
    assert_eq!(chain.process(&zero_rate), zero_rate);
}

#[test]
fn single_track_fusion_is_verbatim_passthrough() {
    let generator = Arc::new(MockGenerator::failing());
    let primary = Arc::new(MockEngine::new("p", french_only("  Bonjour docteur  ")));
    let orch = orchestrator_with(primary, None, Arc::clone(&generator));

    let mut session = SessionContext::new();
    let segment = orch.transcribe_segment(&audio(), &mut session);

    assert_eq!(segment.fused, "Bonjour docteur");
    // Passthrough must not consume a generation call
    assert_eq!(generator.call_count(), 0);
}

#[test]
fn timeout_triggers_exactly_one_fallback_and_no_primary_retry() {
    let primary = Arc::new(
        MockEngine::new("p", vec![Ok("trop tard".to_string())])
            .with_delay(Duration::from_millis(1500)),
    );
    let fallback = Arc::new(MockEngine::new("f", vec![Ok("Secours".to_string())]));
    let orch = orchestrator_with(
        Arc::clone(&primary),
        Some(Arc::clone(&fallback)),
        Arc::new(MockGenerator::failing()),
    );

    let (text, attempts) = orch.transcribe_track(&audio(), LanguageTrack::French);

    assert_eq!(text, "Secours");
    assert_eq!(primary.call_count(), 1, "a timeout must not be retried");
    assert_eq!(fallback.call_count(), 1);
    assert_eq!(attempts.len(), 2);
}

#[test]
fn boilerplate_discards_the_whole_segment() {
    let primary = Arc::new(MockEngine::new(
        "p",
        vec![
            Ok("اشتركوا في القناة".to_string()),
            Ok("Merci d'avoir regardé cette vidéo".to_string()),
        ],
    ));
    let orch = orchestrator_with(primary, None, Arc::new(MockGenerator::failing()));

    let mut session = SessionContext::new();
    let segment = orch.transcribe_segment(&audio(), &mut session);

    assert!(segment.is_empty());
    assert!(segment.segment_id.is_none());
}

#[test]
fn duplicate_pair_is_suppressed_within_a_session() {
    let mut outcomes = french_only("Le patient tousse");
    outcomes.extend(french_only("Le patient tousse"));
    let primary = Arc::new(MockEngine::new("p", outcomes));
    let orch = orchestrator_with(primary, None, Arc::new(MockGenerator::failing()));

    let mut session = SessionContext::new();
    let first = orch.transcribe_segment(&audio(), &mut session);
    let second = orch.transcribe_segment(&audio(), &mut session);

    assert_eq!(first.segment_id, Some(0));
    assert!(second.is_empty());
}

#[test]
fn duplicates_are_session_scoped_not_global() {
    let primary_a = Arc::new(MockEngine::new("p", french_only("Bonjour")));
    let primary_b = Arc::new(MockEngine::new("p", french_only("Bonjour")));
    let orch_a = orchestrator_with(primary_a, None, Arc::new(MockGenerator::failing()));
    let orch_b = orchestrator_with(primary_b, None, Arc::new(MockGenerator::failing()));

    let mut session_a = SessionContext::new();
    let mut session_b = SessionContext::new();

    let a = orch_a.transcribe_segment(&audio(), &mut session_a);
    // Identical pair in a different session must be accepted
    let b = orch_b.transcribe_segment(&audio(), &mut session_b);

    assert_eq!(a.segment_id, Some(0));
    assert_eq!(b.segment_id, Some(0));
}

#[test]
fn segment_ids_increase_and_skip_discards() {
    let mut outcomes = french_only("Premier");
    outcomes.extend(french_only("Premier")); // duplicate, discarded
    outcomes.extend(french_only("Deuxième"));
    let primary = Arc::new(MockEngine::new("p", outcomes));
    let orch = orchestrator_with(primary, None, Arc::new(MockGenerator::failing()));

    let mut session = SessionContext::new();
    let first = orch.transcribe_segment(&audio(), &mut session);
    let duplicate = orch.transcribe_segment(&audio(), &mut session);
    let second = orch.transcribe_segment(&audio(), &mut session);

    assert_eq!(first.segment_id, Some(0));
    assert!(duplicate.segment_id.is_none());
    assert_eq!(second.segment_id, Some(1));
}

#[test]
fn consolidation_failure_joins_in_chronological_order() {
    let consolidation = ConsolidationEngine::new(Arc::new(MockGenerator::failing()));
    let segments: Vec<SegmentResult> = ["Un", "Deux", "Trois"]
        .iter()
        .map(|text| SegmentResult {
            fused: text.to_string(),
            ..SegmentResult::empty()
        })
        .collect();

    assert_eq!(consolidation.consolidate(&segments), "Un\nDeux\nTrois");
}

#[test]
fn empty_transcript_report_short_circuits_without_generation() {
    let generator = Arc::new(MockGenerator::failing());
    let report = ReportGenerator::new(Arc::clone(&generator) as Arc<dyn TextGenerator>);

    let text = report.generate("   ");

    assert_eq!(text, "Impossible de générer un rapport: transcription vide");
    assert_eq!(generator.call_count(), 0);
}

#[test]
fn full_session_flow_produces_a_structured_report() {
    // Two segments recognized, consolidated, then reported
    let mut outcomes = french_only("Le patient a de la fièvre depuis trois jours");
    outcomes.extend(french_only("Pas d'antécédents notables"));
    let primary = Arc::new(MockEngine::new("p", outcomes));
    let orch = orchestrator_with(primary, None, Arc::new(MockGenerator::failing()));

    let mut session = SessionContext::new();
    let segments = vec![
        orch.transcribe_segment(&audio(), &mut session),
        orch.transcribe_segment(&audio(), &mut session),
    ];
    assert!(segments.iter().all(|s| !s.is_empty()));

    let consolidation = ConsolidationEngine::new(Arc::new(MockGenerator::new(vec![Ok(
        "Fièvre depuis trois jours, pas d'antécédents.".to_string(),
    )])));
    let transcript = consolidation.consolidate(&segments);
    assert_eq!(transcript, "Fièvre depuis trois jours, pas d'antécédents.");

    let report_text = "MOTIF DE CONSULTATION\nFièvre\n\nDIAGNOSTIC\nSyndrome viral";
    let report = ReportGenerator::new(Arc::new(MockGenerator::new(vec![Ok(
        report_text.to_string(),
    )])));
    let structured = report
        .generate_structured(&transcript)
        .unwrap_or_else(|| panic!("non-empty transcript must yield a report"));

    assert_eq!(structured.sections.len(), 6);
    assert_eq!(structured.sections[0].1, "Fièvre");
    assert_eq!(structured.sections[3].1, "Syndrome viral");
    // Sections the consultation never covered are marked, not invented
    assert_eq!(
        structured.sections[1].1,
        "Non précisé dans la consultation"
    );
}
