//! Camera and microphone authorization
//!
//! The recording flow refuses to start without a granted camera
//! permission; a denied state is terminal from the crate's point of view
//! (the user has to flip the OS setting).

/// Media kind a permission applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MediaKind {
    Camera,
    Microphone,
}

impl MediaKind {
    fn noun(&self) -> &'static str {
        match self {
            MediaKind::Camera => "camera",
            MediaKind::Microphone => "microphone",
        }
    }
}

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
    /// Permission restricted (parental controls, etc)
    Restricted,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

/// Check permission status for one media kind
pub fn check_permission(kind: MediaKind) -> PermissionStatus {
    check_permission_detailed(kind).status
}

/// Check permission status with detailed information
pub fn check_permission_detailed(kind: MediaKind) -> PermissionInfo {
    #[cfg(target_os = "windows")]
    {
        check_permission_windows(kind)
    }

    #[cfg(target_os = "macos")]
    {
        check_permission_macos(kind)
    }

    #[cfg(target_os = "linux")]
    {
        check_permission_linux(kind)
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        let _ = kind;
        PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Platform not supported".to_string(),
            can_request: false,
        }
    }
}

#[cfg(target_os = "windows")]
fn check_permission_windows(kind: MediaKind) -> PermissionInfo {
    match kind {
        // Windows gates camera access through Privacy settings; successful
        // device enumeration is the closest observable proxy.
        MediaKind::Camera => {
            use nokhwa::query;

            match query(nokhwa::utils::ApiBackend::Auto) {
                Ok(devices) if !devices.is_empty() => PermissionInfo {
                    status: PermissionStatus::Granted,
                    message: "Camera access granted via Windows Privacy settings".to_string(),
                    can_request: false,
                },
                Ok(_) => PermissionInfo {
                    status: PermissionStatus::NotDetermined,
                    message: "No cameras found - permission may not be granted".to_string(),
                    can_request: true,
                },
                Err(e) => PermissionInfo {
                    status: PermissionStatus::Denied,
                    message: format!("Camera access denied: {}", e),
                    can_request: true,
                },
            }
        }
        MediaKind::Microphone => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Enable microphone access in Windows Settings > Privacy > Microphone"
                .to_string(),
            can_request: false,
        },
    }
}

#[cfg(target_os = "macos")]
fn check_permission_macos(kind: MediaKind) -> PermissionInfo {
    use objc::runtime::{Class, Object};
    use objc::{msg_send, sel, sel_impl};
    use std::ffi::CString;

    unsafe {
        let av_capture_device_class = match Class::get("AVCaptureDevice") {
            Some(class) => class,
            None => {
                return PermissionInfo {
                    status: PermissionStatus::NotDetermined,
                    message: "AVFoundation not available".to_string(),
                    can_request: false,
                }
            }
        };

        // Four-char media type codes: "vide" / "soun"
        let type_code = match kind {
            MediaKind::Camera => "vide",
            MediaKind::Microphone => "soun",
        };
        let media_type_code = match CString::new(type_code) {
            Ok(code) => code,
            Err(_) => {
                return PermissionInfo {
                    status: PermissionStatus::NotDetermined,
                    message: "Invalid media type".to_string(),
                    can_request: false,
                }
            }
        };
        let media_type: *mut Object =
            msg_send![av_capture_device_class, mediaTypeForString: media_type_code.as_ptr()];

        // AVAuthorizationStatus: 0 NotDetermined, 1 Restricted, 2 Denied, 3 Authorized
        let auth_status: i64 =
            msg_send![av_capture_device_class, authorizationStatusForMediaType: media_type];

        match auth_status {
            3 => PermissionInfo {
                status: PermissionStatus::Granted,
                message: format!("{} access authorized", kind.noun()),
                can_request: false,
            },
            2 => PermissionInfo {
                status: PermissionStatus::Denied,
                message: format!(
                    "{} access denied - enable in System Preferences > Security & Privacy",
                    kind.noun()
                ),
                can_request: false,
            },
            1 => PermissionInfo {
                status: PermissionStatus::Restricted,
                message: format!("{} access restricted by system policy", kind.noun()),
                can_request: false,
            },
            _ => PermissionInfo {
                status: PermissionStatus::NotDetermined,
                message: format!("{} permission not yet requested", kind.noun()),
                can_request: true,
            },
        }
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux(kind: MediaKind) -> PermissionInfo {
    use std::fs;
    use std::path::Path;

    let (device_paths, group_hint): (Vec<String>, &str) = match kind {
        MediaKind::Camera => (
            (0..10).map(|i| format!("/dev/video{}", i)).collect(),
            "video",
        ),
        MediaKind::Microphone => (vec!["/dev/snd".to_string()], "audio"),
    };

    let present: Vec<_> = device_paths
        .iter()
        .filter(|path| Path::new(path.as_str()).exists())
        .collect();

    if present.is_empty() {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: format!("No {} devices found", kind.noun()),
            can_request: false,
        };
    }

    let first_device = present[0];
    match fs::metadata(first_device) {
        Ok(_) => {
            if in_unix_group(group_hint) {
                PermissionInfo {
                    status: PermissionStatus::Granted,
                    message: format!(
                        "{} access granted (user in {} group, {} found)",
                        kind.noun(),
                        group_hint,
                        first_device
                    ),
                    can_request: false,
                }
            } else {
                PermissionInfo {
                    status: PermissionStatus::Denied,
                    message: format!(
                        "{} exists but user not in {} group - run: sudo usermod -a -G {} $USER",
                        first_device, group_hint, group_hint
                    ),
                    can_request: true,
                }
            }
        }
        Err(e) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!("Cannot access {}: {}", first_device, e),
            can_request: true,
        },
    }
}

#[cfg(target_os = "linux")]
fn in_unix_group(group: &str) -> bool {
    use std::process::Command;

    let output = Command::new("groups").output().ok();

    if let Some(output) = output {
        if let Ok(groups) = String::from_utf8(output.stdout) {
            return groups.split_whitespace().any(|g| g == group) || groups.contains("plugdev");
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        assert_eq!(PermissionStatus::Granted.to_string(), "granted");
        assert_eq!(PermissionStatus::NotDetermined.to_string(), "not_determined");
    }

    #[test]
    fn info_serializes() {
        let info = PermissionInfo {
            status: PermissionStatus::Denied,
            message: "nope".to_string(),
            can_request: true,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("Denied"));
        assert!(json.contains("nope"));
    }
}
