//! Camera and microphone permission commands

use crate::permissions::{check_permission_detailed, MediaKind, PermissionInfo, PermissionStatus};
use tauri::command;

/// Request camera permission (platform-specific)
#[command]
pub async fn request_camera_permission() -> Result<PermissionInfo, String> {
    log::info!("Requesting camera permission");

    let current_status = check_permission_detailed(MediaKind::Camera);

    if current_status.status == PermissionStatus::Granted {
        log::info!("Permission already granted");
        return Ok(current_status);
    }

    if !current_status.can_request {
        log::warn!("Cannot request permission: {}", current_status.message);
        return Ok(current_status);
    }

    #[cfg(target_os = "macos")]
    {
        request_permission_macos(MediaKind::Camera).await
    }

    #[cfg(target_os = "windows")]
    {
        // No programmatic request on Windows; the user flips the toggle
        // in Settings.
        Ok(PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Please enable camera access in Windows Settings > Privacy > Camera"
                .to_string(),
            can_request: false,
        })
    }

    #[cfg(target_os = "linux")]
    {
        Ok(PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Run: sudo usermod -a -G video $USER && newgrp video".to_string(),
            can_request: false,
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        Err("Platform not supported".to_string())
    }
}

#[cfg(target_os = "macos")]
async fn request_permission_macos(kind: MediaKind) -> Result<PermissionInfo, String> {
    use block::ConcreteBlock;
    use objc::runtime::{Class, Object};
    use objc::{msg_send, sel, sel_impl};
    use std::ffi::CString;
    use std::sync::mpsc;
    use std::time::Duration;

    log::info!("Requesting macOS media permission");

    unsafe {
        let av_capture_device_class =
            Class::get("AVCaptureDevice").ok_or("AVFoundation not available")?;

        let code = match kind {
            MediaKind::Camera => "vide",
            MediaKind::Microphone => "soun",
        };
        let media_type_code = CString::new(code).map_err(|_| "Invalid media type".to_string())?;
        let media_type: *mut Object =
            msg_send![av_capture_device_class, mediaTypeForString: media_type_code.as_ptr()];

        let (tx, rx) = mpsc::channel();

        let tx_clone = tx.clone();
        let handler = ConcreteBlock::new(move |granted: bool| {
            let _ = tx_clone.send(granted);
        });
        // Heap-copy the block so it survives the async callback.
        let handler = handler.copy();

        let _: () = msg_send![av_capture_device_class, requestAccessForMediaType:media_type completionHandler:&*handler];
        match rx.recv_timeout(Duration::from_secs(60)) {
            Ok(granted) if granted => {
                log::info!("Permission granted");
                Ok(PermissionInfo {
                    status: PermissionStatus::Granted,
                    message: "Access authorized".to_string(),
                    can_request: false,
                })
            }
            Ok(_) => {
                log::warn!("Permission denied");
                Ok(PermissionInfo {
                    status: PermissionStatus::Denied,
                    message: "Access denied by user".to_string(),
                    can_request: false,
                })
            }
            Err(_) => {
                log::error!("Permission request timed out");
                Err("Permission request timed out".to_string())
            }
        }
    }
}

/// Check camera permission status
#[command]
pub async fn check_camera_permission_status() -> Result<PermissionInfo, String> {
    log::debug!("Checking camera permission status");
    Ok(check_permission_detailed(MediaKind::Camera))
}

/// Check microphone permission status
#[command]
pub async fn check_microphone_permission_status() -> Result<PermissionInfo, String> {
    log::debug!("Checking microphone permission status");
    Ok(check_permission_detailed(MediaKind::Microphone))
}
