//! Frame capture state machine
//!
//! Drives incoming frames into per-clip writers and assembles the
//! ordered clip list. Transitions are strictly linear:
//! idle -> start -> capturing -> end -> idle.

use std::path::PathBuf;

use super::config::RecordingConfig;
use super::writer::ClipWriter;
use crate::errors::ClipError;
use crate::types::{CameraFrame, Clip, ClipList};

/// State of the recording loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CaptureState {
    /// Frames are discarded
    Idle,
    /// Next frame initializes a new clip
    Start,
    /// Frames are appended to the active clip
    Capturing,
    /// Next frame (or an explicit flush) finalizes the active clip
    End,
}

impl CaptureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Start => "start",
            CaptureState::Capturing => "capturing",
            CaptureState::End => "end",
        }
    }
}

/// Per-session clip recorder
pub struct ClipMachine {
    state: CaptureState,
    config: RecordingConfig,
    clips_dir: PathBuf,
    writer: Option<ClipWriter>,
    clips: ClipList,
    dropped_finished: u64,
    last_error: Option<String>,
}

impl ClipMachine {
    pub fn new(clips_dir: PathBuf, config: RecordingConfig) -> Result<Self, ClipError> {
        std::fs::create_dir_all(&clips_dir)
            .map_err(|e| ClipError::Io(format!("Failed to create clips directory: {}", e)))?;

        Ok(Self {
            state: CaptureState::Idle,
            config,
            clips_dir,
            writer: None,
            clips: ClipList::new(),
            dropped_finished: 0,
            last_error: None,
        })
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Begin a new clip. Only valid when idle.
    pub fn request_start(&mut self) -> Result<(), ClipError> {
        match self.state {
            CaptureState::Idle => {
                self.state = CaptureState::Start;
                Ok(())
            }
            other => Err(ClipError::Stream(format!(
                "cannot start a clip from state '{}'",
                other.as_str()
            ))),
        }
    }

    /// End the active clip. Only valid while capturing.
    pub fn request_end(&mut self) -> Result<(), ClipError> {
        match self.state {
            CaptureState::Capturing => {
                self.state = CaptureState::End;
                Ok(())
            }
            other => Err(ClipError::Stream(format!(
                "cannot end a clip from state '{}'",
                other.as_str()
            ))),
        }
    }

    /// Feed one frame through the state machine.
    ///
    /// Failure to initialize a clip's writer abandons that clip (no clip
    /// list entry), returns the machine to idle, and surfaces the error;
    /// recording can continue with the next clip.
    pub fn handle_frame(&mut self, frame: &CameraFrame) -> Result<(), ClipError> {
        match self.state {
            CaptureState::Idle => Ok(()),
            CaptureState::Start => {
                let path = self
                    .clips_dir
                    .join(format!("clip_{}.mp4", uuid::Uuid::new_v4()));

                let mut writer = match ClipWriter::new(&path, self.config.clone()) {
                    Ok(writer) => writer,
                    Err(e) => {
                        self.state = CaptureState::Idle;
                        self.last_error = Some(e.to_string());
                        log::error!("failed to initialize clip writer: {}", e);
                        return Err(e);
                    }
                };

                // The first frame defines the clip's time zero.
                if let Err(e) = writer.append(frame) {
                    self.state = CaptureState::Idle;
                    self.last_error = Some(e.to_string());
                    let _ = std::fs::remove_file(writer.path());
                    return Err(e);
                }

                log::info!("started clip {}", path.display());
                self.writer = Some(writer);
                self.state = CaptureState::Capturing;
                Ok(())
            }
            CaptureState::Capturing => {
                let writer = match self.writer.as_mut() {
                    Some(writer) => writer,
                    None => {
                        // Capturing without a writer means a caller bug;
                        // recover by going idle.
                        self.state = CaptureState::Idle;
                        return Err(ClipError::Stream("no active clip writer".to_string()));
                    }
                };

                match writer.append(frame) {
                    Ok(_) => Ok(()),
                    Err(e) => {
                        self.last_error = Some(e.to_string());
                        self.abandon_active();
                        Err(e)
                    }
                }
            }
            CaptureState::End => {
                // Finalization completes the transition; this frame is
                // not part of the clip.
                self.finalize_active().map(|_| ())
            }
        }
    }

    /// Finalize a clip pending in the end state.
    ///
    /// No-op when idle. Returns the finished clip, if any. Invalid while
    /// a clip is still capturing.
    pub fn flush(&mut self) -> Result<Option<Clip>, ClipError> {
        match self.state {
            CaptureState::Idle => Ok(None),
            CaptureState::End => self.finalize_active(),
            other => Err(ClipError::Stream(format!(
                "cannot flush from state '{}'",
                other.as_str()
            ))),
        }
    }

    fn finalize_active(&mut self) -> Result<Option<Clip>, ClipError> {
        self.state = CaptureState::Idle;

        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => return Ok(None),
        };

        self.dropped_finished += writer.frames_dropped();
        match writer.finish() {
            Ok(clip) => {
                self.clips.push(clip.clone());
                Ok(Some(clip))
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                log::error!("failed to finalize clip: {}", e);
                Err(e)
            }
        }
    }

    fn abandon_active(&mut self) {
        if let Some(writer) = self.writer.take() {
            self.dropped_finished += writer.frames_dropped();
            let _ = std::fs::remove_file(writer.path());
            log::warn!("abandoned clip {}", writer.path().display());
        }
        self.state = CaptureState::Idle;
    }

    pub fn clips(&self) -> &ClipList {
        &self.clips
    }

    pub fn into_clips(self) -> ClipList {
        self.clips
    }

    /// Dropped-frame count across finished and active clips
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_finished
            + self
                .writer
                .as_ref()
                .map(|w| w.frames_dropped())
                .unwrap_or(0)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn frame(ts_us: u64) -> CameraFrame {
        CameraFrame::new(vec![100u8; 320 * 240 * 3], 320, 240, "cam0".into()).with_stamp(0, ts_us)
    }

    fn machine(dir: &std::path::Path) -> ClipMachine {
        ClipMachine::new(dir.to_path_buf(), RecordingConfig::new(320, 240, 30.0)).expect("machine")
    }

    #[test]
    fn idle_discards_frames() {
        let dir = tempdir().expect("tempdir");
        let mut m = machine(dir.path());

        m.handle_frame(&frame(0)).expect("idle frame");
        assert_eq!(m.state(), CaptureState::Idle);
        assert!(m.clips().is_empty());
    }

    #[test]
    fn only_start_is_reachable_from_idle() {
        let dir = tempdir().expect("tempdir");
        let mut m = machine(dir.path());

        assert!(m.request_end().is_err());
        assert!(m.request_start().is_ok());
        assert_eq!(m.state(), CaptureState::Start);
        // A second start before the first frame is rejected too.
        assert!(m.request_start().is_err());
    }

    #[test]
    fn full_cycle_produces_one_clip() {
        let dir = tempdir().expect("tempdir");
        let mut m = machine(dir.path());

        m.request_start().expect("start");
        for i in 0..10u64 {
            m.handle_frame(&frame(i * 33_333)).expect("frame");
        }
        assert_eq!(m.state(), CaptureState::Capturing);
        assert!(m.request_start().is_err());

        m.request_end().expect("end");
        assert_eq!(m.state(), CaptureState::End);

        // The next frame completes finalization and is itself discarded.
        m.handle_frame(&frame(400_000)).expect("finalizing frame");
        assert_eq!(m.state(), CaptureState::Idle);
        assert_eq!(m.clips().len(), 1);
        assert_eq!(m.clips().as_slice()[0].frames, 10);
    }

    #[test]
    fn flush_finalizes_without_a_trailing_frame() {
        let dir = tempdir().expect("tempdir");
        let mut m = machine(dir.path());

        m.request_start().expect("start");
        m.handle_frame(&frame(0)).expect("frame");
        m.request_end().expect("end");

        let clip = m.flush().expect("flush").expect("clip");
        assert_eq!(clip.frames, 1);
        assert_eq!(m.state(), CaptureState::Idle);
        assert_eq!(m.clips().len(), 1);
    }

    #[test]
    fn flush_while_capturing_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let mut m = machine(dir.path());

        m.request_start().expect("start");
        m.handle_frame(&frame(0)).expect("frame");
        assert!(m.flush().is_err());
        assert_eq!(m.state(), CaptureState::Capturing);
    }

    #[test]
    fn clips_accumulate_in_recording_order() {
        let dir = tempdir().expect("tempdir");
        let mut m = machine(dir.path());

        for round in 0..3u64 {
            m.request_start().expect("start");
            let base = round * 10_000_000;
            for i in 0..5u64 {
                m.handle_frame(&frame(base + i * 33_333)).expect("frame");
            }
            m.request_end().expect("end");
            m.flush().expect("flush");
        }

        assert_eq!(m.clips().len(), 3);
        let paths: Vec<_> = m.clips().iter().map(|c| c.path.clone()).collect();
        let mut deduped = paths.clone();
        deduped.dedup();
        assert_eq!(paths.len(), deduped.len(), "each clip gets its own file");
    }

    #[test]
    fn writer_rejecting_one_frame_does_not_crash_the_clip() {
        let dir = tempdir().expect("tempdir");
        let mut m = machine(dir.path());

        m.request_start().expect("start");
        m.handle_frame(&frame(0)).expect("frame");
        m.handle_frame(&frame(33_333)).expect("frame");
        // Stale timestamp: silently dropped by the writer.
        m.handle_frame(&frame(33_333)).expect("stale frame");
        m.handle_frame(&frame(66_666)).expect("frame");
        m.request_end().expect("end");

        let clip = m.flush().expect("flush").expect("clip");
        assert_eq!(clip.frames, 3);
        assert_eq!(m.dropped_frames(), 1);
    }
}
