//! Audio capture side of the pipeline.
//!
//! A CPAL input stream delivers fixed-size hardware frames on its own
//! callback thread; each frame is downmixed to mono f32 and handed to the
//! processing loop over a bounded channel. Accumulation into transcription
//! windows happens on the consumer side in [`WindowBuffer`].

mod dispatch;
mod source;
mod window;

pub use source::{AudioSource, CaptureStream};
pub use window::WindowBuffer;
