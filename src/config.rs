use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub preprocess: PreprocessConfig,
    pub recognition: RecognitionConfig,
    pub generation: GenerationConfig,
    pub filters: FilterConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub block_duration_secs: u32,
    pub silence_threshold: f32,
    pub queue_capacity: usize,
}

/// Preprocessing chain tunables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessConfig {
    pub noise_suppression: f32,
    pub target_db: f32,
    pub compression_threshold: f32,
    pub compression_ratio: f32,
    pub reverb_decay: f32,
    pub bandpass_low_hz: f32,
    pub bandpass_high_hz: f32,
}

/// Recognition engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Primary ASR service base URL.
    pub service_url: String,
    /// Fallback (Whisper-style) transcription endpoint; empty disables fallback.
    pub fallback_url: String,
    /// API key for the fallback/generation services. Never stored in source;
    /// injected from the environment or this file.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub darija_locale: String,
    pub french_locale: String,
}

/// Text-generation (fusion/consolidation/report) configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub service_url: String,
    pub model: String,
    pub report_model: String,
    pub timeout_secs: u64,
}

/// Boilerplate/contamination phrase filters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Phrases that mark a whole recognition result as engine contamination.
    pub boilerplate_phrases: Vec<String>,
    /// Lowercase substrings that invalidate a fused sentence.
    pub fused_reject_phrases: Vec<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            block_duration_secs: defaults::BLOCK_DURATION_SECS,
            silence_threshold: defaults::SILENCE_THRESHOLD,
            queue_capacity: defaults::CAPTURE_QUEUE_CAPACITY,
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            noise_suppression: defaults::NOISE_SUPPRESSION,
            target_db: defaults::TARGET_DB,
            compression_threshold: defaults::COMPRESSION_THRESHOLD,
            compression_ratio: defaults::COMPRESSION_RATIO,
            reverb_decay: defaults::REVERB_DECAY,
            bandpass_low_hz: defaults::BANDPASS_LOW_HZ,
            bandpass_high_hz: defaults::BANDPASS_HIGH_HZ,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:6006".to_string(),
            fallback_url: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            api_key: None,
            timeout_secs: defaults::RECOGNITION_TIMEOUT_SECS,
            max_retries: defaults::RECOGNITION_MAX_RETRIES,
            retry_backoff_ms: defaults::RETRY_BACKOFF_MS,
            darija_locale: defaults::DARIJA_LOCALE.to_string(),
            french_locale: defaults::FRENCH_LOCALE.to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            service_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            report_model: "gpt-4-turbo".to_string(),
            timeout_secs: defaults::GENERATION_TIMEOUT_SECS,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            boilerplate_phrases: vec![
                "اشتركوا في القناة".to_string(),
                "Merci d'avoir regardé cette vidéo".to_string(),
                "Abonnez-vous à la chaîne".to_string(),
            ],
            fused_reject_phrases: vec![
                "abonnez-vous".to_string(),
                "merci d'avoir".to_string(),
                "like".to_string(),
                "subscribe".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config: Config = toml::from_str(&contents)?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - MEDSCRIBE_API_KEY → recognition.api_key
    /// - MEDSCRIBE_ASR_URL → recognition.service_url
    /// - MEDSCRIBE_LLM_URL → generation.service_url
    /// - MEDSCRIBE_AUDIO_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("MEDSCRIBE_API_KEY") {
            if !key.is_empty() {
                self.recognition.api_key = Some(key);
            }
        }

        if let Ok(url) = std::env::var("MEDSCRIBE_ASR_URL") {
            if !url.is_empty() {
                self.recognition.service_url = url;
            }
        }

        if let Ok(url) = std::env::var("MEDSCRIBE_LLM_URL") {
            if !url.is_empty() {
                self.generation.service_url = url;
            }
        }

        if let Ok(device) = std::env::var("MEDSCRIBE_AUDIO_DEVICE") {
            if !device.is_empty() {
                self.audio.device = Some(device);
            }
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/medscribe/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("medscribe")
            .join("config.toml")
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.audio.silence_threshold <= 0.0 {
            anyhow::bail!("audio.silence_threshold must be positive");
        }
        if self.audio.block_duration_secs == 0 {
            anyhow::bail!("audio.block_duration_secs must be at least 1");
        }
        if self.preprocess.bandpass_low_hz >= self.preprocess.bandpass_high_hz {
            anyhow::bail!("preprocess.bandpass_low_hz must be below bandpass_high_hz");
        }
        if self.preprocess.compression_ratio <= 0.0 {
            anyhow::bail!("preprocess.compression_ratio must be positive");
        }
        if !(0.0..=1.0).contains(&self.preprocess.noise_suppression) {
            anyhow::bail!("preprocess.noise_suppression must be between 0.0 and 1.0");
        }
        if self.recognition.timeout_secs == 0 {
            anyhow::bail!("recognition.timeout_secs must be at least 1");
        }
        Ok(())
    }
}
