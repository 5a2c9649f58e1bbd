//! System microphone capture via CPAL.
//!
//! Opens an input device at a fixed sample rate and pushes one mono f32 frame
//! per hardware callback into the frame queue. The callback thread never
//! blocks; all buffering policy lives on the consumer side.

use super::dispatch::FramePump;
use crate::log_debug;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

/// Audio input device opened for a fixed-rate capture session.
///
/// The device, negotiated stream config, and sample format are resolved at
/// open time so that starting the stream cannot change session parameters.
pub struct AudioSource {
    device: cpal::Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    channels: usize,
}

impl AudioSource {
    /// List microphone names in enumeration order, so `--input-device N`
    /// refers to the N-th entry.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Open a capture device by enumeration index (or the system default) and
    /// negotiate a stream at `sample_rate`. Fails up front if the device
    /// cannot supply that rate; the session never resamples.
    pub fn open(device_index: Option<usize>, sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = match device_index {
            Some(index) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices.nth(index).ok_or_else(|| {
                    anyhow!(
                        "input device index {index} not found; run --list-input-devices. {}",
                        mic_permission_hint()
                    )
                })?
            }
            None => host
                .default_input_device()
                .with_context(|| format!("no default input device available. {}", mic_permission_hint()))?,
        };
        let device_name = device
            .name()
            .unwrap_or_else(|_| "unknown input device".to_string());

        // Prefer the supported config with the fewest channels that covers the
        // requested rate; extra channels get downmixed in the callback.
        let supported = device
            .supported_input_configs()
            .with_context(|| format!("failed to query capture formats for '{device_name}'"))?;
        let mut best: Option<cpal::SupportedStreamConfigRange> = None;
        for range in supported {
            if range.min_sample_rate().0 > sample_rate || range.max_sample_rate().0 < sample_rate {
                continue;
            }
            let better = match &best {
                None => true,
                Some(current) => range.channels() < current.channels(),
            };
            if better {
                best = Some(range);
            }
        }
        let range = best.ok_or_else(|| {
            anyhow!("input device '{device_name}' does not support capture at {sample_rate} Hz")
        })?;
        let supported_config = range.with_sample_rate(SampleRate(sample_rate));
        let sample_format = supported_config.sample_format();
        let config: StreamConfig = supported_config.into();
        let channels = usize::from(config.channels.max(1));

        log_debug(&format!(
            "AudioSource config: device='{device_name}' format={sample_format:?} \
             sample_rate={sample_rate}Hz channels={channels}"
        ));

        Ok(Self {
            device,
            config,
            sample_format,
            channels,
        })
    }

    /// Get the name of the active capture device.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Sample rate the stream was negotiated at.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start capturing. Each device callback converts its buffer to mono f32
    /// and pushes it into `sender` without blocking; a saturated queue bumps
    /// `dropped` instead of stalling the audio thread. Stream errors
    /// (overflow, device hiccups) are logged and capture continues.
    pub fn start(
        &self,
        sender: Sender<Vec<f32>>,
        dropped: Arc<AtomicUsize>,
    ) -> Result<CaptureStream> {
        let err_fn = |err| log_debug(&format!("audio_stream_error: {err}"));
        let channels = self.channels;

        // Convert every supported sample type to f32 up front so the rest of
        // the pipeline stays format-agnostic.
        let stream = match self.sample_format {
            SampleFormat::F32 => {
                let mut pump = FramePump::new(channels, sender, dropped);
                self.device.build_input_stream(
                    &self.config,
                    move |data: &[f32], _| pump.push(data, |sample| sample),
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let mut pump = FramePump::new(channels, sender, dropped);
                self.device.build_input_stream(
                    &self.config,
                    move |data: &[i16], _| {
                        pump.push(data, |sample| sample as f32 / 32_768.0_f32)
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let mut pump = FramePump::new(channels, sender, dropped);
                self.device.build_input_stream(
                    &self.config,
                    move |data: &[u16], _| {
                        pump.push(data, |sample| (sample as f32 - 32_768.0_f32) / 32_768.0_f32)
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        stream.play().context("failed to start capture stream")?;
        Ok(CaptureStream {
            stream: Some(stream),
        })
    }
}

/// Guard over a running capture stream. Closing stops the device callbacks
/// and drops the queue sender, which the processing loop observes as
/// end-of-stream. Close happens exactly once, whether explicit or on drop.
pub struct CaptureStream {
    stream: Option<cpal::Stream>,
}

impl CaptureStream {
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                log_debug(&format!("failed to pause audio stream: {err}"));
            }
            drop(stream);
        }
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.close();
    }
}

fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone (enable your terminal)."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone (allow access for your terminal)."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}
