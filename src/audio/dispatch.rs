use crossbeam_channel::{Sender, TrySendError};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Downmix multi-channel input to mono while applying the provided converter so
/// the recognition engine receives a single channel regardless of the
/// microphone layout.
pub(super) fn append_downmixed_samples<T, F>(
    buf: &mut Vec<f32>,
    data: &[T],
    channels: usize,
    mut convert: F,
) where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    // Average each interleaved frame to produce a mono representation.
    let mut acc = 0.0f32;
    let mut count = 0usize;
    for sample in data.iter().copied() {
        acc += convert(sample);
        count += 1;
        if count == channels {
            buf.push(acc / channels as f32);
            acc = 0.0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push(acc / count as f32);
    }
}

/// Callback-side half of the frame queue. Owns the sender; each device
/// callback becomes exactly one mono frame pushed without blocking. The
/// callback runs on the audio subsystem's thread, so the only work done here
/// is conversion, downmix, and a `try_send`.
pub(super) struct FramePump {
    channels: usize,
    sender: Sender<Vec<f32>>,
    dropped: Arc<AtomicUsize>,
}

impl FramePump {
    pub(super) fn new(channels: usize, sender: Sender<Vec<f32>>, dropped: Arc<AtomicUsize>) -> Self {
        Self {
            channels: channels.max(1),
            sender,
            dropped,
        }
    }

    pub(super) fn push<T, F>(&mut self, data: &[T], convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        let mut frame = Vec::with_capacity(data.len() / self.channels + 1);
        append_downmixed_samples(&mut frame, data, self.channels, convert);
        if frame.is_empty() {
            return;
        }
        match self.sender.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                // Consumer fell far behind the device; count it rather than block.
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {
                // Receiver is gone during shutdown; nothing left to do.
            }
        }
    }
}
