//! Recording session commands
//!
//! A session owns one capture session and one clip machine. Commands
//! drive the record/stop cycle, pump captured frames through the state
//! machine, and finish by concatenating the clip list into the output
//! movie.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tauri::command;
use tokio::sync::{Mutex as AsyncMutex, RwLock};

use crate::capture::{CaptureConfig, CaptureSession};
use crate::concat::{self, ExportRequest, ExportResult};
use crate::config::ClipreelConfig;
use crate::permissions::{check_permission, MediaKind, PermissionStatus};
use crate::recording::{CaptureState, ClipMachine, RecordingQuality};
use crate::types::{CameraFormat, CameraPosition};

// Global session registry
lazy_static::lazy_static! {
    static ref SESSION_REGISTRY: Arc<RwLock<HashMap<String, Arc<AsyncMutex<RecorderSession>>>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

/// One active recording session
struct RecorderSession {
    capture: CaptureSession,
    machine: ClipMachine,
    config: ClipreelConfig,
    clips_dir: PathBuf,
}

async fn get_session(session_id: &str) -> Result<Arc<AsyncMutex<RecorderSession>>, String> {
    let registry = SESSION_REGISTRY.read().await;
    registry
        .get(session_id)
        .cloned()
        .ok_or_else(|| format!("Recording session not found: {}", session_id))
}

/// Open a recording session.
///
/// Selects the camera for the requested position (config default when
/// omitted), negotiates the device's highest-fps format unless explicit
/// dimensions are given, and starts frame delivery.
///
/// Returns a session ID for the other commands.
#[command]
pub async fn open_session(
    position: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<f64>,
    quality: Option<String>,
) -> Result<String, String> {
    // A denied camera permission bounces the whole flow; there is no
    // in-app retry.
    match check_permission(MediaKind::Camera) {
        PermissionStatus::Granted => {}
        PermissionStatus::Denied | PermissionStatus::Restricted => {
            log::warn!("Camera permission denied; refusing to open session");
            return Err("Camera permission denied".to_string());
        }
        PermissionStatus::NotDetermined => {
            // The backend will prompt (or fail) at open time.
            log::debug!("Camera permission not determined; proceeding to device open");
        }
    }

    let config = ClipreelConfig::load_or_default();
    config.validate()?;

    let requested_position = match position.as_deref() {
        Some(s) => CameraPosition::parse(s).ok_or_else(|| format!("Unknown position: {}", s))?,
        None => config.camera.default_position,
    };

    let mut capture_config = CaptureConfig::new(requested_position);
    if let (Some(w), Some(h)) = (width, height) {
        capture_config = capture_config
            .with_format(CameraFormat::new(w, h, fps.unwrap_or(30.0) as f32));
    }

    let capture = CaptureSession::open(capture_config).map_err(|e| e.to_string())?;
    capture.start().map_err(|e| e.to_string())?;

    // Recording geometry follows whatever the capture side negotiated.
    let format = capture.format();
    let mut recording_config = config.recording_config();
    recording_config.width = format.width;
    recording_config.height = format.height;
    recording_config.fps = fps.unwrap_or(format.fps as f64);
    if let Some(q) = quality.as_deref().and_then(RecordingQuality::parse) {
        recording_config.quality = q;
        recording_config.bitrate = q.bitrate();
    }

    let session_id = format!("ses_{}", chrono::Utc::now().timestamp_millis());
    let clips_dir = PathBuf::from(&config.storage.clips_directory).join(&session_id);
    let machine = ClipMachine::new(clips_dir.clone(), recording_config).map_err(|e| {
        let _ = capture.close(Duration::from_secs(1));
        e.to_string()
    })?;

    let session = RecorderSession {
        capture,
        machine,
        config,
        clips_dir,
    };

    {
        let mut registry = SESSION_REGISTRY.write().await;
        registry.insert(session_id.clone(), Arc::new(AsyncMutex::new(session)));
    }

    log::info!("session {} opened", session_id);
    Ok(session_id)
}

/// Begin recording a new clip
#[command]
pub async fn start_clip(session_id: String) -> Result<(), String> {
    let session_arc = get_session(&session_id).await?;
    let mut session = session_arc.lock().await;
    session.machine.request_start().map_err(|e| e.to_string())
}

/// End the clip currently being recorded
#[command]
pub async fn end_clip(session_id: String) -> Result<(), String> {
    let session_arc = get_session(&session_id).await?;
    let mut session = session_arc.lock().await;
    session.machine.request_end().map_err(|e| e.to_string())
}

/// Report of one frame-pump pass
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PumpReport {
    /// Frames taken off the capture queue this pass
    pub frames: u64,
    pub capture_state: String,
    pub clips: usize,
    /// Frame errors surfaced during the pass (clip-init failures etc.)
    pub errors: Vec<String>,
}

/// Drain the capture queue through the state machine.
///
/// Call this repeatedly while recording. Per-frame failures are
/// reported but do not abort the pass; recording continues with the
/// next clip.
#[command]
pub async fn pump_frames(session_id: String, budget_ms: Option<u64>) -> Result<PumpReport, String> {
    let session_arc = get_session(&session_id).await?;
    let mut session = session_arc.lock().await;

    let deadline = std::time::Instant::now() + Duration::from_millis(budget_ms.unwrap_or(100));
    let mut frames = 0u64;
    let mut errors = Vec::new();

    while std::time::Instant::now() < deadline {
        let frame = session
            .capture
            .next_frame(Duration::from_millis(20))
            .map_err(|e| e.to_string())?;

        let Some(frame) = frame else { continue };
        frames += 1;

        if let Err(e) = session.machine.handle_frame(&frame) {
            errors.push(e.to_string());
        }
    }

    Ok(PumpReport {
        frames,
        capture_state: session.machine.state().as_str().to_string(),
        clips: session.machine.clips().len(),
        errors,
    })
}

/// Switch between front and back cameras.
///
/// Only valid between clips; the replacement input is built before the
/// old one is given up, so a failed switch leaves the session on the
/// old camera.
#[command]
pub async fn switch_camera(session_id: String, position: String) -> Result<(), String> {
    let new_position =
        CameraPosition::parse(&position).ok_or_else(|| format!("Unknown position: {}", position))?;

    let session_arc = get_session(&session_id).await?;
    let session = session_arc.lock().await;

    if session.machine.state() != CaptureState::Idle {
        return Err("Cannot switch cameras while a clip is recording".to_string());
    }

    session
        .capture
        .switch_position(new_position)
        .map_err(|e| e.to_string())
}

/// Session status snapshot
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub capture_state: String,
    pub position: String,
    pub clips: usize,
    /// Rational total of finished clip durations, in seconds
    pub total_duration_secs: f64,
    /// Frames evicted from the capture queue before consumption
    pub dropped_capture: u64,
    /// Frames rejected by clip writers
    pub dropped_writer: u64,
    pub last_error: Option<String>,
}

/// Get the status of an active session
#[command]
pub async fn get_session_status(session_id: String) -> Result<SessionStatus, String> {
    let session_arc = get_session(&session_id).await?;
    let session = session_arc.lock().await;

    Ok(SessionStatus {
        session_id,
        capture_state: session.machine.state().as_str().to_string(),
        position: session.capture.position().as_str().to_string(),
        clips: session.machine.clips().len(),
        total_duration_secs: session.machine.clips().total_duration().as_seconds(),
        dropped_capture: session.capture.dropped_frames(),
        dropped_writer: session.machine.dropped_frames(),
        last_error: session.machine.last_error().map(String::from),
    })
}

/// List all active session IDs
#[command]
pub async fn list_sessions() -> Result<Vec<String>, String> {
    let registry = SESSION_REGISTRY.read().await;
    Ok(registry.keys().cloned().collect())
}

/// Finish the session: finalize any active clip, stop capture, and
/// concatenate the clip list into `out_<filename>`.
#[command]
pub async fn finish_session(session_id: String, filename: String) -> Result<ExportResult, String> {
    let session_arc = {
        let mut registry = SESSION_REGISTRY.write().await;
        registry
            .remove(&session_id)
            .ok_or_else(|| format!("Recording session not found: {}", session_id))?
    };

    let mut session = Arc::try_unwrap(session_arc)
        .map_err(|_| "Recording session is still in use".to_string())?
        .into_inner();

    match session.machine.state() {
        CaptureState::Capturing => {
            session.machine.request_end().map_err(|e| e.to_string())?;
            session.machine.flush().map_err(|e| e.to_string())?;
        }
        CaptureState::End => {
            session.machine.flush().map_err(|e| e.to_string())?;
        }
        // A start request that never saw a frame has nothing to keep.
        CaptureState::Start | CaptureState::Idle => {}
    }

    if let Err(e) = session.capture.close(Duration::from_secs(2)) {
        log::debug!("closing capture for {}: {}", session_id, e);
    }

    let config = session.config;
    let clips_dir = session.clips_dir;
    let clips = session.machine.into_clips();

    let request = ExportRequest::new(PathBuf::from(&config.storage.output_directory), filename);
    let result = concat::concatenate(&clips, &request)
        .await
        .map_err(|e| e.to_string())?;

    if config.storage.auto_clean_clips {
        for clip in clips.iter() {
            let _ = std::fs::remove_file(&clip.path);
        }
        let _ = std::fs::remove_dir(&clips_dir);
    }

    log::info!(
        "session {} finished: {} clips, {:.2}s -> {}",
        session_id,
        result.placed,
        result.duration.as_seconds(),
        result.path.display()
    );

    Ok(result)
}

/// Abandon a session without exporting. Intermediate clips are removed.
#[command]
pub async fn close_session(session_id: String) -> Result<(), String> {
    let session_arc = {
        let mut registry = SESSION_REGISTRY.write().await;
        registry
            .remove(&session_id)
            .ok_or_else(|| format!("Recording session not found: {}", session_id))?
    };

    let session = Arc::try_unwrap(session_arc)
        .map_err(|_| "Recording session is still in use".to_string())?
        .into_inner();

    if let Err(e) = session.capture.close(Duration::from_secs(2)) {
        log::debug!("closing capture for {}: {}", session_id, e);
    }

    for clip in session.machine.clips().iter() {
        let _ = std::fs::remove_file(&clip.path);
    }
    let _ = std::fs::remove_dir(&session.clips_dir);

    log::info!("session {} closed without export", session_id);
    Ok(())
}
