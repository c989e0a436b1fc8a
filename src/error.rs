//! Error types for medscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedscribeError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors: fatal to starting a session
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    Capture { message: String },

    // Format conversion errors: fatal to processing one file
    #[error("Audio conversion failed: {message}")]
    Conversion { message: String },

    // Preprocessing errors: recovered locally, chain returns the input unchanged
    #[error("Preprocessing stage {stage} failed: {message}")]
    Preprocess { stage: &'static str, message: String },

    // Recognition errors: recovered via retry then fallback engine
    #[error("Recognition engine understood nothing")]
    RecognitionUnrecognized,

    #[error("Recognition service error: {message}")]
    RecognitionService { message: String },

    #[error("Recognition timed out after {seconds}s")]
    RecognitionTimeout { seconds: u64 },

    // Text generation errors: each recovered by its caller's fallback
    #[error("Fusion failed: {message}")]
    Fusion { message: String },

    #[error("Consolidation failed: {message}")]
    Consolidation { message: String },

    #[error("Report generation failed: {message}")]
    Report { message: String },

    #[error("Text generation failed: {message}")]
    Generation { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, MedscribeError>;
