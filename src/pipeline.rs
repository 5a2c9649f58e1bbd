//! The capture -> buffer -> transcribe processing loop.
//!
//! Frames arrive from the audio callback over a bounded channel. The loop
//! owns the accumulation buffer, drains it into the recognition engine each
//! time the window threshold is reached, and forwards results to the sink.
//! While the engine runs, frames keep queueing; nothing is dropped, the
//! transcript just falls further behind wall-clock time.

use crate::audio::WindowBuffer;
use crate::log_debug;
use crate::report::TranscriptSink;
use crate::stt::{DecodeOptions, RecognitionEngine};
use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// How often the loop wakes up to check the stop flag while the queue is idle.
const RECV_POLL_MS: u64 = 100;

/// Immutable session settings for the processing loop.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sample_rate: u32,
    pub window_ms: u64,
    pub channel_capacity: usize,
}

impl PipelineConfig {
    /// Samples per transcription window (the drain threshold).
    pub fn window_samples(&self) -> usize {
        ((u64::from(self.sample_rate) * self.window_ms) / 1000).max(1) as usize
    }
}

/// Why the processing loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// External interrupt (Ctrl+C); graceful shutdown.
    Interrupted,
    /// The capture stream closed and the frame queue disconnected.
    StreamClosed,
}

impl StopCause {
    pub fn label(self) -> &'static str {
        match self {
            StopCause::Interrupted => "interrupted",
            StopCause::StreamClosed => "stream_closed",
        }
    }
}

/// Session counters for observability and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineMetrics {
    pub frames_processed: usize,
    pub frames_dropped: usize,
    pub windows_transcribed: usize,
    pub segments_emitted: usize,
    /// Samples left in a partial window at shutdown; discarded, never flushed.
    pub discarded_samples: usize,
    pub stop_cause: StopCause,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            frames_processed: 0,
            frames_dropped: 0,
            windows_transcribed: 0,
            segments_emitted: 0,
            discarded_samples: 0,
            stop_cause: StopCause::StreamClosed,
        }
    }
}

/// Run the processing loop until interrupted or the stream closes.
///
/// Frames are observed in push order. Every time the accumulated length
/// reaches the window threshold the entire buffer is handed to `engine` as
/// one window and the buffer restarts from empty. A recognition error is
/// fatal: it propagates and the loop terminates without processing further
/// windows. On interrupt, queued frames and any partial window are discarded.
pub fn run_pipeline(
    receiver: &Receiver<Vec<f32>>,
    cfg: &PipelineConfig,
    engine: &dyn RecognitionEngine,
    opts: &DecodeOptions,
    sink: &mut dyn TranscriptSink,
    stop_flag: &AtomicBool,
    dropped: &AtomicUsize,
) -> Result<PipelineMetrics> {
    let mut window = WindowBuffer::new(cfg.window_samples());
    let mut metrics = PipelineMetrics::default();
    let wait = Duration::from_millis(RECV_POLL_MS);

    let stop_cause = loop {
        if stop_flag.load(Ordering::Relaxed) {
            break StopCause::Interrupted;
        }
        match receiver.recv_timeout(wait) {
            Ok(frame) => {
                metrics.frames_processed += 1;
                window.push(&frame);
                if window.is_ready() {
                    let samples = window.drain();
                    let stt_start = Instant::now();
                    let result = engine
                        .transcribe(&samples, opts)
                        .context("transcription failed")?;
                    metrics.windows_transcribed += 1;
                    metrics.segments_emitted += result.segments.len();
                    tracing::info!(
                        window = metrics.windows_transcribed,
                        samples = samples.len(),
                        stt_s = stt_start.elapsed().as_secs_f64(),
                        language = %result.language,
                        segments = result.segments.len(),
                        "window transcribed"
                    );
                    sink.emit(&result).context("failed to emit transcript")?;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break StopCause::StreamClosed,
        }
    };

    metrics.discarded_samples = window.len();
    metrics.frames_dropped = dropped.load(Ordering::Relaxed);
    metrics.stop_cause = stop_cause;
    log_pipeline_metrics(&metrics);
    Ok(metrics)
}

/// Emit structured session counters in a grep-friendly form.
pub(crate) fn log_pipeline_metrics(metrics: &PipelineMetrics) {
    log_debug(&format!(
        "pipeline_metrics|frames_processed={}|frames_dropped={}|windows_transcribed={}|segments_emitted={}|discarded_samples={}|stop_cause={}",
        metrics.frames_processed,
        metrics.frames_dropped,
        metrics.windows_transcribed,
        metrics.segments_emitted,
        metrics.discarded_samples,
        metrics.stop_cause.label()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::{Segment, Transcription};
    use anyhow::anyhow;
    use crossbeam_channel::bounded;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::{Arc, Mutex};

    const RATE: u32 = 16_000;

    fn test_cfg(window_ms: u64) -> PipelineConfig {
        PipelineConfig {
            sample_rate: RATE,
            window_ms,
            channel_capacity: 64,
        }
    }

    fn test_opts() -> DecodeOptions {
        DecodeOptions {
            language: "en".to_string(),
            beam_size: 1,
            temperature: 0.0,
        }
    }

    /// Records every window handed to the engine and replies with one segment
    /// spanning the window.
    struct StubEngine {
        windows: Arc<Mutex<Vec<Vec<f32>>>>,
        fail_on_call: Option<usize>,
    }

    impl StubEngine {
        fn new() -> (Self, Arc<Mutex<Vec<Vec<f32>>>>) {
            let windows = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    windows: windows.clone(),
                    fail_on_call: None,
                },
                windows,
            )
        }

        fn failing_on(call: usize) -> (Self, Arc<Mutex<Vec<Vec<f32>>>>) {
            let (mut engine, windows) = Self::new();
            engine.fail_on_call = Some(call);
            (engine, windows)
        }
    }

    impl RecognitionEngine for StubEngine {
        fn transcribe(&self, samples: &[f32], opts: &DecodeOptions) -> Result<Transcription> {
            let mut windows = self.windows.lock().unwrap();
            windows.push(samples.to_vec());
            if self.fail_on_call == Some(windows.len()) {
                return Err(anyhow!("model exploded"));
            }
            Ok(Transcription {
                language: opts.language.clone(),
                language_probability: 1.0,
                segments: vec![Segment {
                    start: 0.0,
                    end: samples.len() as f32 / RATE as f32,
                    text: format!("window {}", windows.len()),
                }],
            })
        }
    }

    #[derive(Default)]
    struct CollectSink {
        emitted: Vec<Transcription>,
    }

    impl TranscriptSink for CollectSink {
        fn emit(&mut self, transcription: &Transcription) -> Result<()> {
            self.emitted.push(transcription.clone());
            Ok(())
        }
    }

    fn run(
        frames: Vec<Vec<f32>>,
        cfg: &PipelineConfig,
        engine: &dyn RecognitionEngine,
        sink: &mut CollectSink,
    ) -> Result<PipelineMetrics> {
        let (sender, receiver) = bounded(cfg.channel_capacity);
        for frame in frames {
            sender.send(frame).unwrap();
        }
        drop(sender); // loop observes end-of-stream once the queue drains
        let stop = AtomicBool::new(false);
        let dropped = AtomicUsize::new(0);
        run_pipeline(
            &receiver,
            cfg,
            engine,
            &test_opts(),
            sink,
            &stop,
            &dropped,
        )
    }

    #[test]
    fn window_samples_is_rate_times_seconds() {
        assert_eq!(test_cfg(2_000).window_samples(), 32_000);
        assert_eq!(test_cfg(500).window_samples(), 8_000);
    }

    #[test]
    fn five_frames_of_6400_trigger_exactly_one_drain() {
        // 2 s window at 16 kHz = 32000 samples; 5 frames x 6400 = 32000.
        let frames: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32; 6_400]).collect();
        let (engine, windows) = StubEngine::new();
        let mut sink = CollectSink::default();
        let metrics = run(frames, &test_cfg(2_000), &engine, &mut sink).unwrap();

        let windows = windows.lock().unwrap();
        assert_eq!(windows.len(), 1, "exactly one drain after the 5th frame");
        assert_eq!(windows[0].len(), 32_000);
        assert_eq!(metrics.frames_processed, 5);
        assert_eq!(metrics.windows_transcribed, 1);
        assert_eq!(metrics.discarded_samples, 0, "buffer reset to zero");
    }

    #[test]
    fn frames_are_observed_in_push_order_without_loss() {
        // Each frame is filled with its index so the drained window reveals
        // any reordering or loss.
        let frames: Vec<Vec<f32>> = (0..4).map(|i| vec![i as f32; 8_000]).collect();
        let (engine, windows) = StubEngine::new();
        let mut sink = CollectSink::default();
        run(frames, &test_cfg(2_000), &engine, &mut sink).unwrap();

        let windows = windows.lock().unwrap();
        assert_eq!(windows.len(), 1);
        let window = &windows[0];
        assert_eq!(window.len(), 32_000);
        for (i, chunk) in window.chunks(8_000).enumerate() {
            assert!(chunk.iter().all(|&s| s == i as f32), "frame {i} out of order");
        }
    }

    #[test]
    fn frames_straddling_the_threshold_split_into_two_windows() {
        // 500 ms window = 8000 samples. 3 frames x 5000 = 15000: the second
        // frame crosses the threshold (10000 >= 8000), leaving the third to
        // start a fresh buffer.
        let frames: Vec<Vec<f32>> = vec![vec![0.1; 5_000], vec![0.2; 5_000], vec![0.3; 5_000]];
        let (engine, windows) = StubEngine::new();
        let mut sink = CollectSink::default();
        let metrics = run(frames, &test_cfg(500), &engine, &mut sink).unwrap();

        let windows = windows.lock().unwrap();
        assert_eq!(windows.len(), 1, "third frame alone stays below threshold");
        assert_eq!(windows[0].len(), 10_000, "drain takes the whole buffer");
        assert_eq!(metrics.discarded_samples, 5_000, "partial tail discarded");
    }

    #[test]
    fn consecutive_windows_receive_exact_sample_runs() {
        // 8000-sample windows, 4 frames of 4000: two drains of exactly 8000.
        let frames: Vec<Vec<f32>> = (0..4).map(|i| vec![i as f32; 4_000]).collect();
        let (engine, windows) = StubEngine::new();
        let mut sink = CollectSink::default();
        run(frames, &test_cfg(500), &engine, &mut sink).unwrap();

        let windows = windows.lock().unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].len(), 8_000);
        assert_eq!(windows[1].len(), 8_000);
        assert!(windows[0].iter().take(4_000).all(|&s| s == 0.0));
        assert!(windows[1].iter().take(4_000).all(|&s| s == 2.0));
    }

    #[test]
    fn segments_are_emitted_in_window_order() {
        let frames: Vec<Vec<f32>> = (0..4).map(|_| vec![0.0; 8_000]).collect();
        let (engine, _) = StubEngine::new();
        let mut sink = CollectSink::default();
        run(frames, &test_cfg(500), &engine, &mut sink).unwrap();

        let texts: Vec<&str> = sink
            .emitted
            .iter()
            .flat_map(|t| t.segments.iter().map(|s| s.text.as_str()))
            .collect();
        assert_eq!(texts, vec!["window 1", "window 2", "window 3", "window 4"]);
    }

    #[test]
    fn interrupt_discards_partial_buffer_without_transcribing() {
        // 10000 of 32000 samples buffered when the interrupt lands.
        let (sender, receiver) = bounded(64);
        sender.send(vec![0.0f32; 10_000]).unwrap();
        let (engine, windows) = StubEngine::new();
        let mut sink = CollectSink::default();
        let stop = Arc::new(AtomicBool::new(false));
        let dropped = AtomicUsize::new(0);

        // Flag the stop after the single queued frame is consumed.
        let handle = std::thread::spawn({
            let stop = stop.clone();
            move || {
                std::thread::sleep(Duration::from_millis(50));
                stop.store(true, Ordering::Relaxed);
            }
        });

        let metrics = run_pipeline(
            &receiver,
            &test_cfg(2_000),
            &engine,
            &test_opts(),
            &mut sink,
            &stop,
            &dropped,
        )
        .unwrap();
        handle.join().unwrap();

        assert_eq!(metrics.stop_cause, StopCause::Interrupted);
        assert_eq!(metrics.discarded_samples, 10_000);
        assert!(windows.lock().unwrap().is_empty(), "no engine call");
        assert!(sink.emitted.is_empty());
        drop(sender);
    }

    #[test]
    fn engine_error_terminates_the_loop() {
        // Enough frames for two windows, but the first call fails.
        let frames: Vec<Vec<f32>> = (0..4).map(|_| vec![0.0; 4_000]).collect();
        let (engine, windows) = StubEngine::failing_on(1);
        let mut sink = CollectSink::default();
        let err = run(frames, &test_cfg(250), &engine, &mut sink)
            .expect_err("recognition failure is fatal");

        assert!(format!("{err:#}").contains("model exploded"));
        assert_eq!(windows.lock().unwrap().len(), 1, "no further windows");
        assert!(sink.emitted.is_empty());
    }

    #[test]
    fn stream_disconnect_is_a_clean_stop() {
        let (engine, _) = StubEngine::new();
        let mut sink = CollectSink::default();
        let metrics = run(Vec::new(), &test_cfg(2_000), &engine, &mut sink).unwrap();
        assert_eq!(metrics.stop_cause, StopCause::StreamClosed);
        assert_eq!(metrics.windows_transcribed, 0);
    }
}
