use super::defaults::ISO_639_1_CODES;
use super::AppConfig;
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::path::Path;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize paths.
    pub fn validate(&mut self) -> Result<()> {
        if !(8_000..=96_000).contains(&self.sample_rate) {
            bail!(
                "--sample-rate must be between 8000 and 96000 Hz, got {}",
                self.sample_rate
            );
        }
        if !(100..=60_000).contains(&self.window_ms) {
            bail!(
                "--window-ms must be between 100 and 60000 ms, got {}",
                self.window_ms
            );
        }
        if !(8..=4096).contains(&self.channel_capacity) {
            bail!(
                "--channel-capacity must be between 8 and 4096, got {}",
                self.channel_capacity
            );
        }
        if self.beam_size > 10 {
            bail!("--beam-size must be between 0 and 10, got {}", self.beam_size);
        }
        if !(0.0..=5.0).contains(&self.temperature) {
            bail!(
                "--temperature must be between 0.0 and 5.0, got {}",
                self.temperature
            );
        }

        if self.lang.trim().is_empty() {
            bail!("--lang must not be empty");
        }
        if !self.lang.eq_ignore_ascii_case("auto") {
            if !self
                .lang
                .chars()
                .all(|ch| ch.is_ascii_alphabetic() || ch == '-' || ch == '_')
            {
                bail!("--lang must contain only alphabetic characters or '-'/'_' separators");
            }
            // Allow locale-style values but only check the leading ISO-639-1 code.
            let lang_primary = self
                .lang
                .split(['-', '_'])
                .next()
                .unwrap_or("")
                .to_ascii_lowercase();
            if !ISO_639_1_CODES.contains(&lang_primary.as_str()) {
                bail!(
                    "--lang must start with a valid ISO-639-1 code or be 'auto', got '{}'",
                    self.lang
                );
            }
        }

        // Device listing does not need a model; everything else does.
        if self.model_path.is_none() && !self.list_input_devices {
            bail!("--model-path is required (or set LIVESCRIBE_MODEL_PATH)");
        }

        if let Some(model) = &mut self.model_path {
            let model_path = Path::new(model);
            if !model_path.exists() {
                bail!("whisper model path '{}' does not exist", model_path.display());
            }
            // Store a canonical absolute path so logs stay unambiguous.
            let canonical = model_path
                .canonicalize()
                .with_context(|| format!("failed to canonicalize whisper model path '{model}'"))?;
            *model = canonical
                .to_str()
                .map(|s| s.to_string())
                .ok_or_else(|| anyhow!("whisper model path must be valid UTF-8"))?;
        }

        Ok(())
    }
}
