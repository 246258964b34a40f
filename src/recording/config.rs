//! Recording configuration types

use serde::{Deserialize, Serialize};

/// Quality presets for clip recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingQuality {
    /// 720p, lower bitrate - good for previews
    Low,
    /// 1080p, standard bitrate - balanced quality
    Medium,
    /// 1080p, high bitrate
    High,
    /// Custom settings
    Custom,
}

impl RecordingQuality {
    /// Recommended bitrate in bits per second
    pub fn bitrate(&self) -> u32 {
        match self {
            RecordingQuality::Low => 2_500_000,
            RecordingQuality::Medium => 5_000_000,
            RecordingQuality::High => 10_000_000,
            RecordingQuality::Custom => 5_000_000,
        }
    }

    /// Recommended resolution (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            RecordingQuality::Low => (1280, 720),
            RecordingQuality::Medium => (1920, 1080),
            RecordingQuality::High => (1920, 1080),
            RecordingQuality::Custom => (1920, 1080),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" | "720p" => Some(RecordingQuality::Low),
            "medium" | "1080p" => Some(RecordingQuality::Medium),
            "high" => Some(RecordingQuality::High),
            "custom" => Some(RecordingQuality::Custom),
            _ => None,
        }
    }
}

impl Default for RecordingQuality {
    fn default() -> Self {
        RecordingQuality::High
    }
}

/// Quarter-turn rotation applied to frames before encoding.
///
/// The muxer carries no display matrix, so orientation is baked into the
/// pixels; the concatenated output inherits it. 90/270 swap the encoded
/// dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::Clockwise270)
    }

    /// Encoded output dimensions for a source of `width` x `height`.
    pub fn output_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "0" => Some(Rotation::None),
            "cw90" | "90" => Some(Rotation::Clockwise90),
            "cw180" | "180" => Some(Rotation::Clockwise180),
            "cw270" | "270" => Some(Rotation::Clockwise270),
            _ => None,
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::None
    }
}

/// Configuration for writing clips
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Source frame width in pixels (pre-rotation)
    pub width: u32,
    /// Source frame height in pixels (pre-rotation)
    pub height: u32,
    /// Frames per second
    pub fps: f64,
    /// Target bitrate in bits per second
    pub bitrate: u32,
    /// Quality preset used
    pub quality: RecordingQuality,
    /// Enable fast-start (moov before mdat) for progressive playback
    pub fast_start: bool,
    /// Rotation baked into the encoded frames
    pub rotation: Rotation,
    /// Optional title metadata
    pub title: Option<String>,
}

impl RecordingConfig {
    /// Explicit dimensions, everything else defaulted
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
            bitrate: 5_000_000,
            quality: RecordingQuality::Custom,
            fast_start: true,
            rotation: Rotation::None,
            title: None,
        }
    }

    /// Configuration from a quality preset
    pub fn from_quality(quality: RecordingQuality) -> Self {
        let (width, height) = quality.resolution();
        Self {
            width,
            height,
            fps: 30.0,
            bitrate: quality.bitrate(),
            quality,
            fast_start: true,
            rotation: Rotation::None,
            title: None,
        }
    }

    /// Configuration from a quality preset with custom fps
    pub fn from_quality_with_fps(quality: RecordingQuality, fps: f64) -> Self {
        let mut config = Self::from_quality(quality);
        config.fps = fps;
        config
    }

    /// Portrait orientation: the sensor's native landscape frame is
    /// rotated a quarter turn at encode time.
    pub fn portrait(mut self) -> Self {
        self.rotation = Rotation::Clockwise90;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_fast_start(mut self, enabled: bool) -> Self {
        self.fast_start = enabled;
        self
    }

    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// Encoded output dimensions after rotation
    pub fn output_dimensions(&self) -> (u32, u32) {
        self.rotation.output_dimensions(self.width, self.height)
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self::from_quality(RecordingQuality::High)
    }
}
