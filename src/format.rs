//! Normalization of arbitrary audio inputs to mono 16 kHz 16-bit PCM.
//!
//! Uploads arrive as whatever the browser recorded. Decoding tries the
//! cheapest path first: a header sniff routes plain WAV through hound, and
//! MP3/Vorbis/MP4 containers decode in-process through symphonia. Formats
//! symphonia carries no codec for (notably WebM/Opus captures) fall through
//! to an external `ffmpeg` invocation.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::process::{Command, Stdio};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::defaults;
use crate::error::{MedscribeError, Result};
use crate::preprocess::dsp;
use crate::preprocess::AudioBuffer;

/// Audio in the single format every recognition engine accepts:
/// mono, 16 kHz, signed 16-bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAudio {
    pub samples: Vec<i16>,
}

impl NormalizedAudio {
    pub fn sample_rate(&self) -> u32 {
        defaults::SAMPLE_RATE
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / defaults::SAMPLE_RATE as f32
    }

    /// Quantize float samples (already mono/16 kHz) to 16-bit.
    pub fn from_f32(samples: &[f32]) -> Self {
        let samples = samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
            .collect();
        Self { samples }
    }

    /// Back to float samples for further processing.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|&s| s as f32 / i16::MAX as f32)
            .collect()
    }

    /// Serialize to an in-memory WAV file for engine upload.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: defaults::SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| conversion(format!("WAV encode: {}", e)))?;
            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| conversion(format!("WAV encode: {}", e)))?;
            }
            writer
                .finalize()
                .map_err(|e| conversion(format!("WAV encode: {}", e)))?;
        }
        Ok(cursor.into_inner())
    }
}

/// Decodes any supported input to `NormalizedAudio`.
pub struct FormatNormalizer;

impl FormatNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Decode a file on disk, trying hound, symphonia, then ffmpeg.
    pub fn normalize_path(&self, path: &Path) -> Result<NormalizedAudio> {
        if sniff_riff_wave(path)? {
            return decode_wav(path);
        }

        match decode_with_symphonia(path) {
            Ok(audio) => Ok(audio),
            Err(primary) => {
                eprintln!("[format] in-process decode failed ({}), trying ffmpeg", primary);
                decode_with_ffmpeg(path).map_err(|secondary| {
                    conversion(format!(
                        "all decoders failed: {}; {}",
                        primary, secondary
                    ))
                })
            }
        }
    }

    /// Normalize an in-memory buffer (the capture/preprocess path).
    pub fn normalize_buffer(&self, buffer: &AudioBuffer) -> Result<NormalizedAudio> {
        if buffer.sample_rate == 0 || buffer.channels == 0 {
            return Err(conversion("degenerate buffer".to_string()));
        }
        let mono = if buffer.channels > 1 {
            dsp::downmix(&buffer.samples, buffer.channels as usize)
        } else {
            buffer.samples.clone()
        };
        let resampled = dsp::resample_channel(&mono, buffer.sample_rate, defaults::SAMPLE_RATE);
        Ok(NormalizedAudio::from_f32(&resampled))
    }
}

impl Default for FormatNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn conversion(message: String) -> MedscribeError {
    MedscribeError::Conversion { message }
}

/// True when the file starts with a RIFF/WAVE header.
fn sniff_riff_wave(path: &Path) -> Result<bool> {
    let mut header = [0u8; 12];
    let mut file = fs::File::open(path)?;
    match file.read_exact(&mut header) {
        Ok(()) => Ok(&header[0..4] == b"RIFF" && &header[8..12] == b"WAVE"),
        // Shorter than a header: not WAV, let the other decoders reject it
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn decode_wav(path: &Path) -> Result<NormalizedAudio> {
    let mut reader =
        hound::WavReader::open(path).map_err(|e| conversion(format!("WAV decode: {}", e)))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| conversion(format!("WAV decode: {}", e)))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| conversion(format!("WAV decode: {}", e)))?
        }
    };

    resample_and_quantize(samples, spec.sample_rate, spec.channels as usize)
}

fn decode_with_symphonia(path: &Path) -> Result<NormalizedAudio> {
    let file = fs::File::open(path)?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| conversion(format!("container probe: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| conversion("no decodable audio track".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| conversion(format!("codec init: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate = 0u32;
    let mut channels = 0usize;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(e) => return Err(conversion(format!("demux: {}", e))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_buf.is_none() {
                    let spec = *decoded.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count();
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = &mut sample_buf {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            // Corrupt packets are skipped, not fatal
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(conversion(format!("decode: {}", e))),
        }
    }

    if samples.is_empty() || sample_rate == 0 || channels == 0 {
        return Err(conversion("decoder produced no audio".to_string()));
    }
    resample_and_quantize(samples, sample_rate, channels)
}

/// External transcode path; the scoped temp file is removed on every exit.
fn decode_with_ffmpeg(path: &Path) -> Result<NormalizedAudio> {
    let output = tempfile::Builder::new()
        .prefix("medscribe-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| conversion(format!("temp file: {}", e)))?;

    let status = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(path)
        .args(["-ar", "16000", "-ac", "1", "-c:a", "pcm_s16le"])
        .arg(output.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| conversion(format!("ffmpeg not available: {}", e)))?;

    if !status.success() {
        return Err(conversion(format!("ffmpeg exited with {}", status)));
    }

    decode_wav(output.path())
}

fn resample_and_quantize(
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
) -> Result<NormalizedAudio> {
    if samples.is_empty() {
        return Err(conversion("decoded audio is empty".to_string()));
    }
    let mono = if channels > 1 {
        dsp::downmix(&samples, channels)
    } else {
        samples
    };
    let resampled = dsp::resample_channel(&mono, sample_rate, defaults::SAMPLE_RATE);
    Ok(NormalizedAudio::from_f32(&resampled))
}
