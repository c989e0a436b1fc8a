//! HTTP recognition engines.
//!
//! `HttpSpeechEngine` talks to a self-hosted recognition service that takes
//! base64 WAV in a JSON body. `WhisperApiEngine` is the fallback: an
//! OpenAI-style `/audio/transcriptions` multipart upload. Both block; the
//! orchestrator owns the deadline.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use crate::asr::engine::{RecognitionEngine, RecognitionFailure};
use crate::format::NormalizedAudio;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

fn service_error(e: reqwest::Error) -> RecognitionFailure {
    if e.is_timeout() {
        RecognitionFailure::Timeout
    } else {
        RecognitionFailure::ServiceError(e.to_string())
    }
}

/// Reduce "fr-FR" / "ar-MA" to the two-letter code Whisper services expect.
fn short_language_code(locale: &str) -> &str {
    locale.split('-').next().unwrap_or(locale)
}

fn build_client(timeout: Duration) -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Primary engine: JSON request with base64-encoded WAV payload.
pub struct HttpSpeechEngine {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpSpeechEngine {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            url: url.to_string(),
        }
    }
}

impl RecognitionEngine for HttpSpeechEngine {
    fn name(&self) -> &str {
        "http-speech"
    }

    fn transcribe(
        &self,
        audio: &NormalizedAudio,
        locale: &str,
    ) -> std::result::Result<String, RecognitionFailure> {
        let wav = audio
            .to_wav_bytes()
            .map_err(|e| RecognitionFailure::ServiceError(e.to_string()))?;

        let body = serde_json::json!({
            "audio": BASE64.encode(&wav),
            "language": locale,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(service_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecognitionFailure::ServiceError(format!(
                "HTTP {}",
                status
            )));
        }

        let parsed: TranscriptionResponse = response.json().map_err(service_error)?;
        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            Err(RecognitionFailure::Unrecognized)
        } else {
            Ok(text)
        }
    }
}

/// Fallback engine: Whisper-style multipart transcription endpoint.
pub struct WhisperApiEngine {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
    model: String,
}

impl WhisperApiEngine {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: "whisper-1".to_string(),
        }
    }
}

impl RecognitionEngine for WhisperApiEngine {
    fn name(&self) -> &str {
        "whisper-api"
    }

    fn transcribe(
        &self,
        audio: &NormalizedAudio,
        locale: &str,
    ) -> std::result::Result<String, RecognitionFailure> {
        let wav = audio
            .to_wav_bytes()
            .map_err(|e| RecognitionFailure::ServiceError(e.to_string()))?;

        let part = reqwest::blocking::multipart::Part::bytes(wav)
            .file_name("segment.wav")
            .mime_str("audio/wav")
            .map_err(|e| RecognitionFailure::ServiceError(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", short_language_code(locale).to_string())
            .text("response_format", "json");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(service_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecognitionFailure::ServiceError(format!(
                "HTTP {}",
                status
            )));
        }

        let parsed: TranscriptionResponse = response.json().map_err(service_error)?;
        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            Err(RecognitionFailure::Unrecognized)
        } else {
            Ok(text)
        }
    }
}
