//! Clipreel: multi-clip camera recording and concatenation for Tauri
//! applications
//!
//! This crate records short video clips from a camera - front or back,
//! switchable between clips - into individual MP4 files, then
//! concatenates the ordered clip list into a single movie optimized for
//! progressive playback.
//!
//! # Features
//! - Cross-platform camera capture (Windows, macOS, Linux)
//! - Strictly sequenced clip recording (idle/start/capturing/end)
//! - Rational-time clip timeline with drift-free accumulation
//! - Lossless stream-copy concatenation of recorded clips
//! - Tri-state camera/microphone permission handling
//!
//! # Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! clipreel = "0.3"
//! tauri = { version = "2.0", features = ["protocol-asset"] }
//! ```
//!
//! Then in your Tauri app:
//! ```rust,ignore
//! use clipreel;
//!
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(clipreel::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
pub mod capture;
pub mod commands;
pub mod concat;
pub mod config;
pub mod errors;
pub mod permissions;
pub mod platform;
pub mod recording;
pub mod timing;
pub mod types;

// Re-exports for convenience
pub use capture::{CaptureConfig, CaptureSession};
pub use concat::{concatenate, ExportRequest, ExportResult, Timeline};
pub use errors::ClipError;
pub use recording::{CaptureState, ClipMachine, RecordingConfig};
pub use timing::{MediaTime, PtsClock};
pub use types::{
    CameraDeviceInfo, CameraFormat, CameraFrame, CameraPosition, Clip, ClipList, Platform,
};

use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

/// Initialize the clipreel plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("clipreel")
        .invoke_handler(tauri::generate_handler![
            // Initialization commands
            commands::init::initialize_recorder,
            commands::init::get_available_cameras,
            commands::init::get_platform_info,
            commands::init::check_camera_availability,
            // Permission commands
            commands::permissions::request_camera_permission,
            commands::permissions::check_camera_permission_status,
            commands::permissions::check_microphone_permission_status,
            // Session commands
            commands::session::open_session,
            commands::session::start_clip,
            commands::session::end_clip,
            commands::session::pump_frames,
            commands::session::switch_camera,
            commands::session::get_session_status,
            commands::session::list_sessions,
            commands::session::finish_session,
            commands::session::close_session,
        ])
        .build()
}

/// Detect the current platform using the Platform enum
pub fn current_platform() -> Platform {
    Platform::current()
}

/// Initialize logging for the recorder
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "clipreel=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        platform: Platform::current(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub platform: Platform,
}
