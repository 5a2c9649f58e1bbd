//! Whisper speech-to-text integration.
//!
//! Wraps `whisper_rs` behind a [`RecognitionEngine`] seam. The model is
//! loaded once at startup and reused for every window to avoid repeated
//! initialization overhead; each `transcribe` call is stateless.

use anyhow::Result;

/// Decode tunables passed through to the model unchanged.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Language hint; "auto" enables detection.
    pub language: String,
    /// >1 enables beam search with the given width.
    pub beam_size: u32,
    pub temperature: f32,
}

/// One timestamped span of recognized (or silent) speech within a window.
/// Times are seconds relative to the start of the window.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: f32,
    pub end: f32,
    pub text: String,
}

/// Result of transcribing one window of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    pub language: String,
    /// Confidence in [0, 1]. 1.0 when the language was pinned by the hint.
    pub language_probability: f32,
    pub segments: Vec<Segment>,
}

/// Seam between the processing loop and the model so tests can stub the
/// engine. The call blocks until the whole window is decoded.
pub trait RecognitionEngine {
    fn transcribe(&self, samples: &[f32], opts: &DecodeOptions) -> Result<Transcription>;
}

#[cfg(unix)]
mod platform {
    use super::{DecodeOptions, Segment, Transcription};
    use anyhow::{anyhow, Context, Result};
    use std::io;
    use std::os::raw::{c_char, c_uint, c_void};
    use std::os::unix::io::AsRawFd;
    use std::sync::Once;
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    /// Whisper model context for speech-to-text transcription.
    ///
    /// Holds the loaded GGML model in memory. Create once at startup and
    /// reuse for all windows.
    pub struct Transcriber {
        ctx: WhisperContext,
    }

    impl Transcriber {
        /// Loads the Whisper model from disk.
        ///
        /// Temporarily redirects stderr to `/dev/null` during loading because
        /// whisper.cpp emits verbose initialization messages.
        ///
        /// # Errors
        ///
        /// Returns an error if the model file cannot be loaded or stderr
        /// redirection fails.
        pub fn new(model_path: &str) -> Result<Self> {
            install_whisper_log_silencer();

            let null = std::fs::OpenOptions::new()
                .write(true)
                .open("/dev/null")
                .context("failed to open /dev/null")?;
            let null_fd = null.as_raw_fd();

            // SAFETY: dup(2) duplicates the stderr file descriptor. We restore it
            // after model loading completes. This is safe because we hold the only
            // reference and restore before returning.
            let orig_stderr = unsafe { libc::dup(2) };
            if orig_stderr < 0 {
                return Err(anyhow!(
                    "failed to dup stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            // Redirect stderr to /dev/null temporarily
            let dup_result = unsafe { libc::dup2(null_fd, 2) };
            if dup_result < 0 {
                unsafe {
                    libc::close(orig_stderr);
                }
                return Err(anyhow!(
                    "failed to redirect stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            // Load model (output will be suppressed)
            let ctx_result =
                WhisperContext::new_with_params(model_path, WhisperContextParameters::default());

            // Restore original stderr
            let restore_result = unsafe { libc::dup2(orig_stderr, 2) };
            unsafe {
                libc::close(orig_stderr);
            }
            if restore_result < 0 {
                return Err(anyhow!(
                    "failed to restore stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            let ctx = ctx_result.context("failed to load whisper model")?;
            Ok(Self { ctx })
        }

        /// Run transcription for one window of mono 16-bit-equivalent f32 PCM
        /// and return timestamped segments plus the detected language.
        pub fn transcribe(&self, samples: &[f32], opts: &DecodeOptions) -> Result<Transcription> {
            let auto_detect = opts.language.eq_ignore_ascii_case("auto");
            let mut state = self
                .ctx
                .create_state()
                .context("failed to create whisper state")?;
            let mut params = if opts.beam_size > 1 {
                FullParams::new(SamplingStrategy::BeamSearch {
                    beam_size: opts.beam_size as i32,
                    patience: -1.0,
                })
            } else {
                FullParams::new(SamplingStrategy::Greedy { best_of: 1 })
            };
            if auto_detect {
                params.set_language(None);
                params.set_detect_language(true);
            } else {
                params.set_language(Some(&opts.language));
                params.set_detect_language(false);
            }
            params.set_temperature(opts.temperature);
            // Limit CPU usage so laptops don't max out all cores.
            params.set_n_threads(num_cpus::get().min(8) as i32);
            params.set_print_progress(false);
            params.set_print_timestamps(false);
            params.set_print_special(false);
            params.set_print_realtime(false);
            params.set_translate(false);
            params.set_token_timestamps(false);

            state
                .full(params, samples)
                .context("whisper inference failed")?;

            let num_segments = state
                .full_n_segments()
                .context("failed to read segment count")?;
            if num_segments < 0 {
                return Err(anyhow!("whisper returned a negative segment count"));
            }

            let mut segments = Vec::with_capacity(num_segments as usize);
            for i in 0..num_segments {
                let text = state
                    .full_get_segment_text_lossy(i)
                    .with_context(|| format!("failed to read segment {i}"))?;
                // Whisper reports timestamps in centiseconds.
                let start = state
                    .full_get_segment_t0(i)
                    .with_context(|| format!("failed to read segment {i} start"))?
                    as f32
                    / 100.0;
                let end = state
                    .full_get_segment_t1(i)
                    .with_context(|| format!("failed to read segment {i} end"))?
                    as f32
                    / 100.0;
                segments.push(Segment { start, end, text });
            }

            let (language, language_probability) = if auto_detect {
                let lang_id = state
                    .full_lang_id_from_state()
                    .context("failed to read detected language")?;
                let language = whisper_rs::get_lang_str(lang_id)
                    .unwrap_or("unknown")
                    .to_string();
                (language, mean_token_probability(&state, num_segments)?)
            } else {
                (opts.language.to_ascii_lowercase(), 1.0)
            };

            Ok(Transcription {
                language,
                language_probability,
                segments,
            })
        }
    }

    /// whisper.cpp does not expose per-language probabilities after a full
    /// decode, so auto-detect confidence is reported as the mean token
    /// probability across the window (0.0 for a window with no tokens).
    fn mean_token_probability(
        state: &whisper_rs::WhisperState,
        num_segments: std::os::raw::c_int,
    ) -> Result<f32> {
        let mut sum = 0.0f32;
        let mut count = 0usize;
        for i in 0..num_segments {
            let tokens = state
                .full_n_tokens(i)
                .with_context(|| format!("failed to read token count for segment {i}"))?;
            for t in 0..tokens {
                let data = state
                    .full_get_token_data(i, t)
                    .with_context(|| format!("failed to read token {t} of segment {i}"))?;
                sum += data.p;
                count += 1;
            }
        }
        if count == 0 {
            Ok(0.0)
        } else {
            Ok((sum / count as f32).clamp(0.0, 1.0))
        }
    }

    fn install_whisper_log_silencer() {
        static INSTALL_LOG_CALLBACK: Once = Once::new();
        INSTALL_LOG_CALLBACK.call_once(|| unsafe {
            whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
        });
    }

    #[allow(unused_variables)]
    unsafe extern "C" fn whisper_log_callback(
        _level: c_uint,
        _text: *const c_char,
        _user_data: *mut c_void,
    ) {
        // Silence the default whisper.cpp logger so it does not interleave
        // with transcript output.
    }
}

#[cfg(unix)]
pub use platform::Transcriber;

#[cfg(not(unix))]
mod platform {
    use super::{DecodeOptions, Transcription};
    use anyhow::{anyhow, Result};

    /// Stub implementation for unsupported targets such as Windows.
    pub struct Transcriber;

    impl Transcriber {
        pub fn new(_: &str) -> Result<Self> {
            Err(anyhow!(
                "Whisper transcription is currently supported only on Unix-like platforms"
            ))
        }

        pub fn transcribe(&self, _: &[f32], _: &DecodeOptions) -> Result<Transcription> {
            Err(anyhow!(
                "Whisper transcription is currently supported only on Unix-like platforms"
            ))
        }
    }
}

#[cfg(not(unix))]
pub use platform::Transcriber;

impl RecognitionEngine for Transcriber {
    fn transcribe(&self, samples: &[f32], opts: &DecodeOptions) -> Result<Transcription> {
        Transcriber::transcribe(self, samples, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn transcriber_rejects_missing_model() {
        let result = Transcriber::new("/no/such/model.bin");
        assert!(result.is_err());
    }

    #[test]
    fn segment_times_are_window_relative() {
        let segment = Segment {
            start: 0.0,
            end: 1.32,
            text: "hello".to_string(),
        };
        assert!(segment.end > segment.start);
    }
}
