//! Per-OS camera backends
//!
//! Thin wrappers over nokhwa's native backends (V4L2, AVFoundation,
//! MediaFoundation) behind one `PlatformCamera` dispatch type.

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "windows")]
pub mod windows;

use crate::errors::ClipError;
use crate::types::{CameraDeviceInfo, CameraFrame, CameraInitParams, Platform};

/// List available cameras on the current platform
pub fn list_cameras() -> Result<Vec<CameraDeviceInfo>, ClipError> {
    #[cfg(target_os = "linux")]
    {
        linux::list_cameras()
    }
    #[cfg(target_os = "macos")]
    {
        macos::list_cameras()
    }
    #[cfg(target_os = "windows")]
    {
        windows::list_cameras()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        Err(ClipError::Initialization(
            "Unsupported platform".to_string(),
        ))
    }
}

/// Backend name used by the current platform
pub fn backend_name() -> &'static str {
    match Platform::current() {
        Platform::Linux => "Video4Linux",
        Platform::MacOS => "AVFoundation",
        Platform::Windows => "MediaFoundation",
        Platform::Unknown => "none",
    }
}

/// Platform-dispatched camera handle
pub enum PlatformCamera {
    #[cfg(target_os = "linux")]
    Linux(linux::LinuxCamera),
    #[cfg(target_os = "macos")]
    MacOS(macos::MacOSCamera),
    #[cfg(target_os = "windows")]
    Windows(windows::WindowsCamera),
}

impl PlatformCamera {
    pub fn new(params: CameraInitParams) -> Result<Self, ClipError> {
        #[cfg(target_os = "linux")]
        {
            linux::initialize_camera(params).map(PlatformCamera::Linux)
        }
        #[cfg(target_os = "macos")]
        {
            macos::initialize_camera(params).map(PlatformCamera::MacOS)
        }
        #[cfg(target_os = "windows")]
        {
            windows::initialize_camera(params).map(PlatformCamera::Windows)
        }
        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let _ = params;
            Err(ClipError::Initialization(
                "Unsupported platform".to_string(),
            ))
        }
    }

    pub fn start_stream(&mut self) -> Result<(), ClipError> {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(cam) => cam.start_stream(),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(cam) => cam.start_stream(),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(cam) => cam.start_stream(),
        }
    }

    pub fn stop_stream(&mut self) -> Result<(), ClipError> {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(cam) => cam.stop_stream(),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(cam) => cam.stop_stream(),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(cam) => cam.stop_stream(),
        }
    }

    pub fn capture_frame(&mut self) -> Result<CameraFrame, ClipError> {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(cam) => cam.capture_frame(),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(cam) => cam.capture_frame(),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(cam) => cam.capture_frame(),
        }
    }

    pub fn device_id(&self) -> &str {
        match self {
            #[cfg(target_os = "linux")]
            PlatformCamera::Linux(cam) => cam.device_id(),
            #[cfg(target_os = "macos")]
            PlatformCamera::MacOS(cam) => cam.device_id(),
            #[cfg(target_os = "windows")]
            PlatformCamera::Windows(cam) => cam.device_id(),
        }
    }
}
