//! Initialization and device discovery commands

use crate::platform;
use crate::types::{CameraDeviceInfo, Platform};
use tauri::command;

/// Platform summary returned to the frontend
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlatformInfo {
    pub platform: Platform,
    pub backend: String,
    pub cameras: usize,
}

/// Initialize the recorder for the current platform
#[command]
pub async fn initialize_recorder() -> Result<String, String> {
    match platform::list_cameras() {
        Ok(cameras) => {
            let message = format!(
                "clipreel ready on {} ({} cameras via {})",
                Platform::current().as_str(),
                cameras.len(),
                platform::backend_name()
            );
            log::info!("{}", message);
            Ok(message)
        }
        Err(e) => {
            log::error!("Failed to initialize recorder: {}", e);
            Err(format!("Failed to initialize recorder: {}", e))
        }
    }
}

/// List available cameras on the current platform
#[command]
pub async fn get_available_cameras() -> Result<Vec<CameraDeviceInfo>, String> {
    match platform::list_cameras() {
        Ok(cameras) => {
            log::info!("Found {} cameras", cameras.len());
            for camera in &cameras {
                log::debug!(
                    "Camera: {} - {} (Available: {})",
                    camera.id,
                    camera.name,
                    camera.is_available
                );
            }
            Ok(cameras)
        }
        Err(e) => {
            log::error!("Failed to list cameras: {}", e);
            Err(format!("Failed to list cameras: {}", e))
        }
    }
}

/// Get platform-specific information
#[command]
pub async fn get_platform_info() -> Result<PlatformInfo, String> {
    let cameras = platform::list_cameras().map_err(|e| {
        log::error!("Failed to get platform info: {}", e);
        format!("Failed to get platform info: {}", e)
    })?;

    Ok(PlatformInfo {
        platform: Platform::current(),
        backend: platform::backend_name().to_string(),
        cameras: cameras.len(),
    })
}

/// Check if a specific camera is available
#[command]
pub async fn check_camera_availability(device_id: String) -> Result<bool, String> {
    match platform::list_cameras() {
        Ok(cameras) => {
            let is_available = cameras
                .iter()
                .find(|camera| camera.id == device_id)
                .map(|camera| camera.is_available)
                .unwrap_or(false);

            log::debug!("Camera {} availability: {}", device_id, is_available);
            Ok(is_available)
        }
        Err(e) => {
            log::error!("Failed to check camera availability: {}", e);
            Err(format!("Failed to check camera availability: {}", e))
        }
    }
}
