//! Runtime configuration
//!
//! TOML-backed settings for camera defaults, recording parameters, and
//! clip/output storage.

use crate::errors::ClipError;
use crate::recording::{RecordingConfig, RecordingQuality, Rotation};
use crate::types::CameraPosition;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipreelConfig {
    pub camera: CameraSection,
    pub recording: RecordingSection,
    pub storage: StorageSection,
}

/// Camera defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSection {
    /// Lens position used when a session doesn't specify one
    pub default_position: CameraPosition,
    /// Default capture resolution [width, height]
    pub default_resolution: [u32; 2],
    /// Default frames per second
    pub default_fps: u32,
}

/// Recording defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSection {
    pub quality: RecordingQuality,
    /// Target bitrate in bits per second
    pub bitrate: u32,
    /// Rotation baked into every clip
    pub rotation: Rotation,
    /// moov-before-mdat output for progressive playback
    pub fast_start: bool,
}

/// Storage and file management
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Directory holding per-clip intermediate files
    pub clips_directory: String,
    /// Directory receiving the concatenated output
    pub output_directory: String,
    /// Delete intermediate clips after a successful export
    pub auto_clean_clips: bool,
}

impl Default for ClipreelConfig {
    fn default() -> Self {
        Self {
            camera: CameraSection {
                default_position: CameraPosition::Front,
                default_resolution: [1280, 720],
                default_fps: 30,
            },
            recording: RecordingSection {
                quality: RecordingQuality::High,
                bitrate: RecordingQuality::High.bitrate(),
                // The sensor delivers landscape; portrait output is the
                // recording default.
                rotation: Rotation::Clockwise90,
                fast_start: true,
            },
            storage: StorageSection {
                clips_directory: "./clips".to_string(),
                output_directory: "./videos".to_string(),
                auto_clean_clips: true,
            },
        }
    }
}

impl ClipreelConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClipError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ClipError::Initialization(format!("Failed to read config file: {}", e)))?;

        let config: ClipreelConfig = toml::from_str(&contents)
            .map_err(|e| ClipError::Initialization(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ClipError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClipError::Initialization(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ClipError::Initialization(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| ClipError::Initialization(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("clipreel.toml")
    }

    /// Load from the default location, or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.default_resolution[0] == 0 || self.camera.default_resolution[1] == 0 {
            return Err("Invalid default resolution".to_string());
        }
        if self.camera.default_fps == 0 || self.camera.default_fps > 240 {
            return Err("Invalid default FPS (must be 1-240)".to_string());
        }
        if self.recording.bitrate < 100_000 {
            return Err("Bitrate must be at least 100 kbps".to_string());
        }
        if self.storage.clips_directory.is_empty() || self.storage.output_directory.is_empty() {
            return Err("Storage directories must not be empty".to_string());
        }
        Ok(())
    }

    /// Recording configuration derived from these defaults
    pub fn recording_config(&self) -> RecordingConfig {
        RecordingConfig::new(
            self.camera.default_resolution[0],
            self.camera.default_resolution[1],
            self.camera.default_fps as f64,
        )
        .with_bitrate(self.recording.bitrate)
        .with_fast_start(self.recording.fast_start)
        .with_rotation(self.recording.rotation)
    }
}
