//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::Parser;

pub use defaults::{
    DEFAULT_BEAM_SIZE, DEFAULT_CHANNEL_CAPACITY, DEFAULT_LANG, DEFAULT_SAMPLE_RATE,
    DEFAULT_TEMPERATURE, DEFAULT_WINDOW_MS,
};

use crate::pipeline::PipelineConfig;
use crate::stt::DecodeOptions;

/// CLI options for the live transcription session. Values are immutable once
/// validated and shared read-only with the capture callback and the
/// processing loop.
#[derive(Debug, Parser, Clone)]
#[command(about = "LiveScribe - live microphone transcription", author, version)]
pub struct AppConfig {
    /// Audio input device index (omit to use the system default)
    #[arg(long = "input-device")]
    pub input_device: Option<usize>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Capture sample rate in Hz
    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Audio accumulated per transcription window (milliseconds)
    #[arg(long = "window-ms", default_value_t = DEFAULT_WINDOW_MS)]
    pub window_ms: u64,

    /// Frame channel capacity between the capture callback and the processing loop
    #[arg(long = "channel-capacity", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Path to the Whisper ggml model file
    #[arg(long = "model-path", env = "LIVESCRIBE_MODEL_PATH")]
    pub model_path: Option<String>,

    /// Language hint passed to Whisper ("auto" enables detection)
    #[arg(long, default_value = DEFAULT_LANG)]
    pub lang: String,

    /// Whisper beam size (>1 enables beam search)
    #[arg(long = "beam-size", default_value_t = DEFAULT_BEAM_SIZE)]
    pub beam_size: u32,

    /// Whisper sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "LIVESCRIBE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "LIVESCRIBE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Allow logging transcript snippets (debug log only)
    #[arg(
        long = "log-content",
        env = "LIVESCRIBE_LOG_CONTENT",
        default_value_t = false
    )]
    pub log_content: bool,

    /// Enable verbose timing logs
    #[arg(long)]
    pub log_timings: bool,
}

impl AppConfig {
    /// Snapshot the settings the processing loop needs.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            sample_rate: self.sample_rate,
            window_ms: self.window_ms,
            channel_capacity: self.channel_capacity,
        }
    }

    /// Snapshot the decode tunables passed through to the recognition engine.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            language: self.lang.clone(),
            beam_size: self.beam_size,
            temperature: self.temperature,
        }
    }
}
