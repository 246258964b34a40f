//! Device and format selection
//!
//! Desktop backends do not report a lens position, so front/back is
//! resolved from device names and descriptions, with enumeration order
//! as the tiebreaker (built-in devices enumerate first on every backend
//! we support).

use crate::errors::ClipError;
use crate::types::{CameraDeviceInfo, CameraFormat, CameraPosition};
use std::cmp::Ordering;

const FRONT_HINTS: &[&str] = &["front", "facetime", "integrated", "built-in", "builtin", "user"];
const BACK_HINTS: &[&str] = &["back", "rear", "world", "environment"];

/// Pick the device best matching the requested position.
///
/// No devices at all is an unrecoverable startup precondition and
/// returns an error.
pub fn select_device(
    devices: &[CameraDeviceInfo],
    position: CameraPosition,
) -> Result<&CameraDeviceInfo, ClipError> {
    let available: Vec<&CameraDeviceInfo> =
        devices.iter().filter(|d| d.is_available).collect();

    if available.is_empty() {
        return Err(ClipError::Initialization(
            "No capture devices present".to_string(),
        ));
    }

    let best_score = available
        .iter()
        .map(|d| position_score(d, position))
        .max()
        .unwrap_or(0);

    let candidates: Vec<&CameraDeviceInfo> = available
        .into_iter()
        .filter(|d| position_score(d, position) == best_score)
        .collect();

    // Among equally-scored devices: front prefers the first enumerated
    // (the built-in), back prefers the last (the external).
    let chosen = match position {
        CameraPosition::Front => candidates.first(),
        CameraPosition::Back => candidates.last(),
    };

    chosen.copied().ok_or_else(|| {
        ClipError::Initialization("No capture devices present".to_string())
    })
}

fn position_score(device: &CameraDeviceInfo, position: CameraPosition) -> i32 {
    let mut haystack = device.name.to_ascii_lowercase();
    if let Some(desc) = &device.description {
        haystack.push(' ');
        haystack.push_str(&desc.to_ascii_lowercase());
    }

    let (wanted, opposite) = match position {
        CameraPosition::Front => (FRONT_HINTS, BACK_HINTS),
        CameraPosition::Back => (BACK_HINTS, FRONT_HINTS),
    };

    let mut score = 0;
    for hint in wanted {
        if haystack.contains(hint) {
            score += 2;
        }
    }
    for hint in opposite {
        if haystack.contains(hint) {
            score -= 1;
        }
    }
    score
}

/// Pick the supported format with the highest frame rate; ties go to the
/// larger resolution. Devices that report no formats get the standard
/// preset.
pub fn select_format(device: &CameraDeviceInfo) -> CameraFormat {
    device
        .supports_formats
        .iter()
        .max_by(|a, b| {
            a.fps
                .partial_cmp(&b.fps)
                .unwrap_or(Ordering::Equal)
                .then(a.pixel_count().cmp(&b.pixel_count()))
        })
        .cloned()
        .unwrap_or_else(CameraFormat::standard)
}
