//! Audio capture for the classifier
//!
//! Sources hand back short WAV clips. Any failure to obtain audio is reported as
//! `NoiseError::Microphone`, which the session treats as a persistent sensor error.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use tracing::debug;

use errors::{NoiseError, NoiseResult};
use noise_core::{AudioSample, AudioSource};

pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 16_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSourceKind {
    #[default]
    None,
    File,
    Microphone,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub source: AudioSourceKind,
    /// WAV clip used by the `file` source
    pub path: Option<PathBuf>,
}

/// Build the configured source
pub fn build_source(config: &AudioConfig) -> NoiseResult<Arc<dyn AudioSource>> {
    match config.source {
        AudioSourceKind::None => Ok(Arc::new(UnavailableSource::new(
            "no audio source configured",
        ))),
        AudioSourceKind::File => {
            let path = config
                .path
                .clone()
                .ok_or_else(|| NoiseError::invalid_config("audio.path", "required for file source"))?;
            Ok(Arc::new(WavFileSource::new(path)))
        },
        #[cfg(feature = "microphone")]
        AudioSourceKind::Microphone => Ok(Arc::new(MicrophoneSource::new())),
        #[cfg(not(feature = "microphone"))]
        AudioSourceKind::Microphone => Ok(Arc::new(UnavailableSource::new(
            "built without microphone support",
        ))),
    }
}

/// Encode mono `f32` samples as 16-bit PCM WAV
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> NoiseResult<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * f32::from(i16::MAX)) as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Re-encode at most `duration` of a WAV clip
pub fn trim_wav(bytes: &[u8], duration: Duration) -> NoiseResult<Vec<u8>> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let limit = (duration.as_secs_f64()
        * f64::from(spec.sample_rate)
        * f64::from(spec.channels)) as usize;

    match spec.sample_format {
        SampleFormat::Float => copy_samples::<f32>(reader, spec, limit),
        SampleFormat::Int => copy_samples::<i32>(reader, spec, limit),
    }
}

fn copy_samples<S: hound::Sample + Copy>(
    mut reader: WavReader<Cursor<&[u8]>>,
    spec: WavSpec,
    limit: usize,
) -> NoiseResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in reader.samples::<S>().take(limit) {
            writer.write_sample(sample?)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Always fails; stands in when no capture device is available
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    reason: String,
}

impl UnavailableSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AudioSource for UnavailableSource {
    async fn capture(&self, _duration: Duration) -> NoiseResult<AudioSample> {
        Err(NoiseError::Microphone(self.reason.clone()))
    }
}

/// Replays a WAV file from disk
#[derive(Debug, Clone)]
pub struct WavFileSource {
    path: PathBuf,
}

impl WavFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AudioSource for WavFileSource {
    async fn capture(&self, duration: Duration) -> NoiseResult<AudioSample> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            NoiseError::Microphone(format!("{}: {}", self.path.display(), e))
        })?;
        let clip = trim_wav(&bytes, duration).map_err(|e| {
            NoiseError::Microphone(format!("{}: {}", self.path.display(), e))
        })?;
        debug!("Captured {} bytes from {}", clip.len(), self.path.display());
        Ok(AudioSample::wav(clip))
    }
}

#[cfg(feature = "microphone")]
pub use microphone::MicrophoneSource;

#[cfg(feature = "microphone")]
mod microphone {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::SampleFormat;
    use tracing::{debug, warn};

    use errors::{NoiseError, NoiseResult};
    use noise_core::{AudioSample, AudioSource};

    use super::encode_wav;

    /// Default input device through cpal
    #[derive(Debug, Clone, Default)]
    pub struct MicrophoneSource;

    impl MicrophoneSource {
        pub fn new() -> Self {
            Self
        }
    }

    fn mic_error(context: &str, err: impl std::fmt::Display) -> NoiseError {
        NoiseError::Microphone(format!("{}: {}", context, err))
    }

    fn push_mono<T: Copy>(buffer: &Mutex<Vec<f32>>, data: &[T], channels: usize, convert: fn(T) -> f32) {
        if let Ok(mut samples) = buffer.lock() {
            samples.extend(data.chunks(channels).map(|frame| {
                frame.iter().map(|s| convert(*s)).sum::<f32>() / frame.len() as f32
            }));
        }
    }

    /// Blocking capture; the cpal stream never leaves this thread
    fn record(duration: Duration) -> NoiseResult<(Vec<f32>, u32)> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| NoiseError::Microphone("no input device".to_string()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| mic_error("failed to get default input config", e))?;

        let sample_format = supported.sample_format();
        let config = supported.config();
        let sample_rate = config.sample_rate.0;
        let channels = usize::from(config.channels.max(1));

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let on_error = |e| warn!("Input stream error: {}", e);

        let stream = match sample_format {
            SampleFormat::F32 => {
                let buffer = Arc::clone(&buffer);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _| push_mono(&buffer, data, channels, |s| s),
                    on_error,
                    None,
                )
            },
            SampleFormat::I16 => {
                let buffer = Arc::clone(&buffer);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _| {
                        push_mono(&buffer, data, channels, |s| f32::from(s) / f32::from(i16::MAX))
                    },
                    on_error,
                    None,
                )
            },
            SampleFormat::U16 => {
                let buffer = Arc::clone(&buffer);
                device.build_input_stream(
                    &config,
                    move |data: &[u16], _| {
                        push_mono(&buffer, data, channels, |s| {
                            (f32::from(s) - 32_768.0) / 32_768.0
                        })
                    },
                    on_error,
                    None,
                )
            },
            other => {
                return Err(NoiseError::Microphone(format!(
                    "unsupported input sample format: {:?}",
                    other
                )))
            },
        }
        .map_err(|e| mic_error("failed to build input stream", e))?;

        stream
            .play()
            .map_err(|e| mic_error("failed to start input stream", e))?;
        std::thread::sleep(duration);
        drop(stream);

        let samples = buffer
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .map_err(|_| NoiseError::Internal("capture buffer poisoned".to_string()))?;
        debug!("Recorded {} samples at {} Hz", samples.len(), sample_rate);
        Ok((samples, sample_rate))
    }

    #[async_trait]
    impl AudioSource for MicrophoneSource {
        async fn capture(&self, duration: Duration) -> NoiseResult<AudioSample> {
            let (samples, sample_rate) = tokio::task::spawn_blocking(move || record(duration))
                .await
                .map_err(|e| NoiseError::Internal(format!("capture task failed: {}", e)))??;

            if samples.is_empty() {
                return Err(NoiseError::Microphone("input device produced no audio".to_string()));
            }
            Ok(AudioSample::wav(encode_wav(&samples, sample_rate)?))
        }
    }
}
