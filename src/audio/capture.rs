//! Microphone capture using CPAL.
//!
//! Streams audio in fixed 5-second blocks, gates out silence by RMS, and
//! feeds surviving blocks into a bounded queue. The capture callback runs on
//! the audio subsystem's own thread; a separate monitor thread only keeps the
//! session alive while recording.

use crate::audio::block::{audio_level, BlockAssembler, CaptureStatus, GateDecision, RawAudioBlock};
use crate::config::AudioConfig;
use crate::error::{MedscribeError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched from the thread that owns the
/// `AudioCapture`; start/stop are called synchronously and never cross
/// thread boundaries.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Streaming microphone reader with block-level silence gating.
///
/// State machine: Idle → Recording → Idle. `start` while Recording and
/// `stop` while Idle are both no-ops.
pub struct AudioCapture {
    config: AudioConfig,
    status: Arc<Mutex<CaptureStatus>>,
    recording: Arc<AtomicBool>,
    stream: Option<SendableStream>,
    monitor: Option<JoinHandle<()>>,
    block_tx: Sender<RawAudioBlock>,
    block_rx: Receiver<RawAudioBlock>,
}

impl AudioCapture {
    pub fn new(config: AudioConfig) -> Self {
        let (block_tx, block_rx) = bounded(config.queue_capacity);
        Self {
            config,
            status: Arc::new(Mutex::new(CaptureStatus::default())),
            recording: Arc::new(AtomicBool::new(false)),
            stream: None,
            monitor: None,
            block_tx,
            block_rx,
        }
    }

    /// Begin capturing. No-op when already recording.
    ///
    /// # Errors
    /// Failing to open the input device is fatal to starting a session.
    /// Mid-stream device errors are reported through the status message
    /// instead, so `status()` keeps working after hardware drops.
    pub fn start(&mut self) -> Result<()> {
        if self.recording.load(Ordering::SeqCst) {
            return Ok(());
        }

        let device = self.find_device()?;
        let stream = self.build_stream(&device)?;
        stream.play().map_err(|e| MedscribeError::Capture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        self.recording.store(true, Ordering::SeqCst);
        write_status(&self.status, |s| {
            s.recording = true;
            s.status_message = "Enregistrement en cours".to_string();
        });

        // Keep-alive loop; performs no data manipulation.
        let recording = Arc::clone(&self.recording);
        self.monitor = Some(std::thread::spawn(move || {
            while recording.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(100));
            }
        }));

        self.stream = Some(SendableStream(stream));
        Ok(())
    }

    /// Stop capturing. No-op when idle. Already-queued blocks remain consumable.
    pub fn stop(&mut self) -> Result<()> {
        if !self.recording.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(sendable) = self.stream.take() {
            sendable.0.pause().map_err(|e| MedscribeError::Capture {
                message: format!("Failed to stop audio stream: {}", e),
            })?;
        }

        if let Some(handle) = self.monitor.take() {
            let _ = handle.join();
        }

        write_status(&self.status, |s| {
            s.recording = false;
            s.audio_level = 0.0;
            s.status_message = "Enregistrement arrêté".to_string();
        });
        Ok(())
    }

    /// Snapshot of the advisory status record. Never fails, never blocks on
    /// more than the brief status lock.
    pub fn status(&self) -> CaptureStatus {
        match self.status.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Consumer side of the bounded block queue.
    pub fn blocks(&self) -> Receiver<RawAudioBlock> {
        self.block_rx.clone()
    }

    fn find_device(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();

        if let Some(name) = &self.config.device {
            let devices = host.input_devices().map_err(|e| MedscribeError::Capture {
                message: format!("Failed to enumerate devices: {}", e),
            })?;
            for device in devices {
                if device.name().map(|n| &n == name).unwrap_or(false) {
                    return Ok(device);
                }
            }
            return Err(MedscribeError::AudioDeviceNotFound {
                device: name.clone(),
            });
        }

        host.default_input_device()
            .ok_or_else(|| MedscribeError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    }

    fn build_stream(&self, device: &cpal::Device) -> Result<cpal::Stream> {
        let stream_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut assembler = BlockAssembler::new(
            self.config.sample_rate,
            self.config.block_duration_secs,
            self.config.silence_threshold,
        );
        let status = Arc::clone(&self.status);
        let recording = Arc::clone(&self.recording);
        let tx = self.block_tx.clone();

        let err_status = Arc::clone(&self.status);
        let err_callback = move |err: cpal::StreamError| {
            // Reported through the status record, not re-thrown: capture keeps
            // reporting state even when hardware has dropped.
            write_status(&err_status, |s| {
                s.status_message = format!("Erreur du flux audio: {}", err);
            });
        };

        device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !recording.load(Ordering::SeqCst) {
                        return;
                    }
                    match assembler.push(data) {
                        GateDecision::Speech(block) => {
                            write_status(&status, |s| {
                                s.audio_level = audio_level(block.rms);
                                s.status_message = "Parole détectée".to_string();
                            });
                            match tx.try_send(block) {
                                Ok(()) => {}
                                Err(TrySendError::Full(_)) => {
                                    write_status(&status, |s| {
                                        s.status_message =
                                            "File de blocs pleine, bloc ignoré".to_string();
                                    });
                                }
                                Err(TrySendError::Disconnected(_)) => {}
                            }
                        }
                        GateDecision::Silence { rms } => {
                            write_status(&status, |s| {
                                s.audio_level = audio_level(rms);
                                s.status_message = "Silence détecté".to_string();
                            });
                        }
                        GateDecision::Pending => {}
                    }
                },
                err_callback,
                None,
            )
            .map_err(|e| MedscribeError::Capture {
                message: format!("Failed to build input stream: {}", e),
            })
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn write_status(status: &Arc<Mutex<CaptureStatus>>, f: impl FnOnce(&mut CaptureStatus)) {
    match status.lock() {
        Ok(mut guard) => f(&mut guard),
        Err(poisoned) => f(&mut poisoned.into_inner()),
    }
}
