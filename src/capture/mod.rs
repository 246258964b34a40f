//! Capture session configuration and serial frame delivery

mod select;
mod session;

pub use select::{select_device, select_format};
pub use session::{CaptureSession, SessionState};

use crate::types::{CameraFormat, CameraPosition};

/// Policy for the frame queue between the capture thread and consumers
#[derive(Debug, Clone)]
pub enum BufferPolicy {
    /// Bounded queue; the oldest frame is evicted when full
    DropOldest { capacity: usize },
}

/// Configuration for opening a capture session
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Requested lens position
    pub position: CameraPosition,
    /// Explicit format; when absent the device's highest-fps format wins
    pub format: Option<CameraFormat>,
    pub buffer_policy: BufferPolicy,
}

impl CaptureConfig {
    pub fn new(position: CameraPosition) -> Self {
        Self {
            position,
            format: None,
            buffer_policy: BufferPolicy::DropOldest { capacity: 4 },
        }
    }

    pub fn with_format(mut self, format: CameraFormat) -> Self {
        self.format = Some(format);
        self
    }
}
