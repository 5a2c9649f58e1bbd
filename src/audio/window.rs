//! Sample accumulation between transcription passes.

/// Growable mono sample buffer owned exclusively by the processing loop.
///
/// Frames are appended until the configured threshold is reached, then the
/// entire contents are handed off as one window and the buffer restarts from
/// empty. There is no overlap or carry-over between windows, so speech that
/// straddles a window boundary is split across two recognition calls.
pub struct WindowBuffer {
    samples: Vec<f32>,
    threshold: usize,
}

impl WindowBuffer {
    /// `threshold` is the minimum sample count that triggers a drain,
    /// typically `sample_rate * window_seconds`.
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            samples: Vec::with_capacity(threshold),
            threshold,
        }
    }

    pub fn push(&mut self, frame: &[f32]) {
        self.samples.extend_from_slice(frame);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// True once enough audio is buffered for one window.
    pub fn is_ready(&self) -> bool {
        self.samples.len() >= self.threshold
    }

    /// Take the full contents and reset to empty. Never drains partially.
    pub fn drain(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.samples)
    }
}
