//! Core data model: devices, formats, frames, clips

use crate::timing::MediaTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Supported desktop platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    MacOS,
    Linux,
    Unknown,
}

impl Platform {
    pub fn current() -> Self {
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }
        #[cfg(target_os = "linux")]
        {
            Platform::Linux
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            Platform::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOS => "macos",
            Platform::Linux => "linux",
            Platform::Unknown => "unknown",
        }
    }
}

/// Requested lens position.
///
/// Phone-style front/back; on desktops this maps to built-in versus
/// external devices via a name heuristic in the capture module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraPosition {
    Front,
    Back,
}

impl CameraPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraPosition::Front => "front",
            CameraPosition::Back => "back",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Some(CameraPosition::Front),
            "back" | "rear" => Some(CameraPosition::Back),
            _ => None,
        }
    }
}

/// One capture format a device supports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub format_type: String,
}

impl CameraFormat {
    pub fn new(width: u32, height: u32, fps: f32) -> Self {
        Self {
            width,
            height,
            fps,
            format_type: "RGB8".to_string(),
        }
    }

    pub fn hd() -> Self {
        Self::new(1920, 1080, 30.0)
    }

    pub fn standard() -> Self {
        Self::new(1280, 720, 30.0)
    }

    pub fn low() -> Self {
        Self::new(640, 480, 30.0)
    }

    pub fn with_format_type(mut self, format_type: String) -> Self {
        self.format_type = format_type;
        self
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A camera known to the platform backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraDeviceInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub supports_formats: Vec<CameraFormat>,
    pub is_available: bool,
}

impl CameraDeviceInfo {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            description: None,
            supports_formats: Vec::new(),
            is_available: true,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_formats(mut self, formats: Vec<CameraFormat>) -> Self {
        self.supports_formats = formats;
        self
    }

    pub fn with_availability(mut self, available: bool) -> Self {
        self.is_available = available;
        self
    }
}

/// One captured frame.
///
/// `sequence` and `timestamp_us` are stamped by the capture session when
/// the frame leaves the platform backend; both are zero on a frame fresh
/// from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraFrame {
    pub id: String,
    pub sequence: u64,
    pub timestamp_us: u64,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub device_id: String,
    pub size_bytes: usize,
    pub data: Vec<u8>,
}

impl CameraFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, device_id: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sequence: 0,
            timestamp_us: 0,
            width,
            height,
            format: "RGB8".to_string(),
            device_id,
            size_bytes: data.len(),
            data,
        }
    }

    pub fn with_format(mut self, format: String) -> Self {
        self.format = format;
        self
    }

    pub fn with_stamp(mut self, sequence: u64, timestamp_us: u64) -> Self {
        self.sequence = sequence;
        self.timestamp_us = timestamp_us;
        self
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.width > 0 && self.height > 0
    }
}

/// Parameters for opening a platform camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraInitParams {
    pub device_id: String,
    pub format: CameraFormat,
}

impl CameraInitParams {
    pub fn new(device_id: String) -> Self {
        Self {
            device_id,
            format: CameraFormat::standard(),
        }
    }

    pub fn with_format(mut self, format: CameraFormat) -> Self {
        self.format = format;
        self
    }
}

/// A finished recorded segment: one file, immutable once finalized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    pub path: PathBuf,
    pub duration: MediaTime,
    pub frames: u64,
}

impl Clip {
    pub fn new(path: PathBuf, duration: MediaTime, frames: u64) -> Self {
        Self {
            path,
            duration,
            frames,
        }
    }
}

/// Ordered, append-only list of clips.
///
/// Insertion order is recording order and is the playback order of the
/// concatenated output; entries are never rearranged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipList {
    clips: Vec<Clip>,
}

impl ClipList {
    pub fn new() -> Self {
        Self { clips: Vec::new() }
    }

    pub fn push(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clip> {
        self.clips.iter()
    }

    pub fn as_slice(&self) -> &[Clip] {
        &self.clips
    }

    /// Rational sum of all clip durations.
    pub fn total_duration(&self) -> MediaTime {
        self.clips
            .iter()
            .fold(MediaTime::zero(), |acc, c| acc.add(c.duration))
    }
}

impl From<Vec<Clip>> for ClipList {
    fn from(clips: Vec<Clip>) -> Self {
        Self { clips }
    }
}
