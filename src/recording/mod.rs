//! Clip recording: encoding, per-clip writing, and the capture state
//! machine
//!
//! # Example
//! ```rust,ignore
//! use clipreel::recording::{ClipMachine, RecordingConfig};
//!
//! let config = RecordingConfig::new(1280, 720, 30.0).portrait();
//! let mut machine = ClipMachine::new(clips_dir, config)?;
//!
//! machine.request_start()?;
//! // In your frame loop:
//! machine.handle_frame(&frame)?;
//! // When the user taps stop:
//! machine.request_end()?;
//! machine.flush()?;
//! ```

mod config;
mod encoder;
mod machine;
mod writer;

pub use config::{RecordingConfig, RecordingQuality, Rotation};
pub use encoder::{ClipEncoder, EncodedChunk};
pub use machine::{CaptureState, ClipMachine};
pub use writer::{ClipWriter, FrameDisposition};
