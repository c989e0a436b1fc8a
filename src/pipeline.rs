//! End-to-end wiring: format normalization, preprocessing, transcription,
//! consolidation and report generation for one session.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::asr::{
    HttpSpeechEngine, RecognitionEngine, SegmentResult, SessionContext,
    TranscriptionOrchestrator, WhisperApiEngine,
};
use crate::audio::block::RawAudioBlock;
use crate::config::Config;
use crate::defaults;
use crate::error::Result;
use crate::format::FormatNormalizer;
use crate::preprocess::{AudioBuffer, PreprocessingChain};
use crate::text::{
    ChatCompletionGenerator, ConsolidationEngine, FusionEngine, ReportGenerator, TextGenerator,
};

pub struct Pipeline {
    normalizer: FormatNormalizer,
    chain: PreprocessingChain,
    orchestrator: TranscriptionOrchestrator,
    consolidation: ConsolidationEngine,
    report: ReportGenerator,
    min_upload_bytes: u64,
}

impl Pipeline {
    /// Wire the production engines from configuration.
    ///
    /// The fallback engine is attached only when a fallback URL and an API
    /// key are both configured; keys come from the config file or the
    /// MEDSCRIBE_API_KEY environment variable, never from source.
    pub fn from_config(config: &Config) -> Self {
        let recognition_timeout = Duration::from_secs(config.recognition.timeout_secs);
        let generation_timeout = Duration::from_secs(config.generation.timeout_secs);

        let primary: Arc<dyn RecognitionEngine> = Arc::new(HttpSpeechEngine::new(
            &config.recognition.service_url,
            recognition_timeout,
        ));
        let fallback: Option<Arc<dyn RecognitionEngine>> = match &config.recognition.api_key {
            Some(key) if !config.recognition.fallback_url.is_empty() => {
                Some(Arc::new(WhisperApiEngine::new(
                    &config.recognition.fallback_url,
                    key,
                    recognition_timeout,
                )))
            }
            _ => None,
        };

        let fusion_generator: Arc<dyn TextGenerator> = Arc::new(ChatCompletionGenerator::new(
            &config.generation.service_url,
            config.recognition.api_key.clone(),
            &config.generation.model,
            generation_timeout,
        ));
        let report_generator: Arc<dyn TextGenerator> = Arc::new(ChatCompletionGenerator::new(
            &config.generation.service_url,
            config.recognition.api_key.clone(),
            &config.generation.report_model,
            generation_timeout,
        ));

        let fusion = FusionEngine::new(
            Arc::clone(&fusion_generator),
            config.filters.fused_reject_phrases.clone(),
        );
        let orchestrator = TranscriptionOrchestrator::new(
            primary,
            fallback,
            fusion,
            config.recognition.clone(),
            config.filters.boilerplate_phrases.clone(),
        );

        Self {
            normalizer: FormatNormalizer::new(),
            chain: PreprocessingChain::new(config.preprocess.clone()),
            orchestrator,
            consolidation: ConsolidationEngine::new(fusion_generator),
            report: ReportGenerator::new(report_generator),
            min_upload_bytes: defaults::MIN_UPLOAD_BYTES,
        }
    }

    /// Assemble a pipeline from pre-built stages; tests inject mocks here.
    pub fn new(
        chain: PreprocessingChain,
        orchestrator: TranscriptionOrchestrator,
        consolidation: ConsolidationEngine,
        report: ReportGenerator,
    ) -> Self {
        Self {
            normalizer: FormatNormalizer::new(),
            chain,
            orchestrator,
            consolidation,
            report,
            min_upload_bytes: defaults::MIN_UPLOAD_BYTES,
        }
    }

    /// Process one uploaded audio file.
    ///
    /// Files below the minimum size cannot hold speech and yield an empty
    /// segment without touching decoders or engines.
    pub fn process_path(&self, path: &Path, session: &mut SessionContext) -> Result<SegmentResult> {
        if fs::metadata(path)?.len() < self.min_upload_bytes {
            return Ok(SegmentResult::empty());
        }

        let normalized = self.normalizer.normalize_path(path)?;
        let buffer = AudioBuffer::mono(normalized.to_f32(), normalized.sample_rate());
        self.transcribe_buffer(&buffer, session)
    }

    /// Process one captured (already silence-gated) block.
    pub fn process_block(
        &self,
        block: &RawAudioBlock,
        session: &mut SessionContext,
    ) -> Result<SegmentResult> {
        self.transcribe_buffer(&AudioBuffer::from(block), session)
    }

    fn transcribe_buffer(
        &self,
        buffer: &AudioBuffer,
        session: &mut SessionContext,
    ) -> Result<SegmentResult> {
        let cleaned = self.chain.process(buffer);
        let audio = self.normalizer.normalize_buffer(&cleaned)?;
        Ok(self.orchestrator.transcribe_segment(&audio, session))
    }

    /// Consolidate the session's accepted segments into one transcript.
    pub fn consolidate(&self, segments: &[SegmentResult]) -> String {
        self.consolidation.consolidate(segments)
    }

    /// Render the medical report for a consolidated transcript.
    pub fn report(&self, transcript: &str) -> String {
        self.report.generate(transcript)
    }
}
