//! Capture session: one camera, one capture thread, one serial frame
//! queue
//!
//! Frames are delivered by a dedicated thread, one at a time, into a
//! bounded drop-oldest queue; consumers pop with a timeout and never
//! block the delivery path.

use super::select::{select_device, select_format};
use super::{BufferPolicy, CaptureConfig};
use crate::errors::ClipError;
use crate::platform::{self, PlatformCamera};
use crate::timing::PtsClock;
use crate::types::{CameraDeviceInfo, CameraFormat, CameraFrame, CameraInitParams, CameraPosition};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Started,
    Stopped,
    Closed,
}

struct FrameQueue {
    inner: Mutex<QueueInner>,
    cv: Condvar,
}

struct QueueInner {
    frames: VecDeque<CameraFrame>,
    capacity: usize,
    dropped: u64,
    closed: bool,
}

impl FrameQueue {
    fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                frames: VecDeque::with_capacity(capacity.min(64)),
                capacity: capacity.max(1),
                dropped: 0,
                closed: false,
            }),
            cv: Condvar::new(),
        }
    }

    fn push_drop_oldest(&self, frame: CameraFrame) {
        let mut g = self.inner.lock().expect("lock poisoned");
        if g.closed {
            return;
        }
        if g.frames.len() >= g.capacity {
            g.frames.pop_front();
            g.dropped = g.dropped.saturating_add(1);
        }
        g.frames.push_back(frame);
        self.cv.notify_one();
    }

    fn pop_timeout(&self, timeout: Duration) -> Result<Option<CameraFrame>, ClipError> {
        let mut g = self.inner.lock().expect("lock poisoned");

        if timeout == Duration::ZERO {
            return Ok(g.frames.pop_front());
        }

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(frame) = g.frames.pop_front() {
                return Ok(Some(frame));
            }
            if g.closed {
                return Err(ClipError::Stream("session is closed".to_string()));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let (ng, _) = self
                .cv
                .wait_timeout(g, deadline - now)
                .expect("lock poisoned");
            g = ng;
        }
    }

    fn dropped(&self) -> u64 {
        self.inner.lock().expect("lock poisoned").dropped
    }

    fn close(&self) {
        let mut g = self.inner.lock().expect("lock poisoned");
        g.closed = true;
        self.cv.notify_all();
    }
}

struct Inner {
    state: Mutex<SessionState>,
    camera: Mutex<Option<PlatformCamera>>,
    device: Mutex<CameraDeviceInfo>,
    position: Mutex<CameraPosition>,
    format: Mutex<CameraFormat>,
    queue: FrameQueue,
    clock: PtsClock,
    next_sequence: Mutex<u64>,
    capture_thread: Mutex<Option<std::thread::JoinHandle<()>>>,
    stop_flag: Arc<AtomicBool>,
}

/// Cloneable handle to a capture session
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<Inner>,
}

impl CaptureSession {
    /// Select a device for the requested position, negotiate the
    /// highest-fps format, and open the camera.
    pub fn open(config: CaptureConfig) -> Result<Self, ClipError> {
        let devices = platform::list_cameras()?;
        let device = select_device(&devices, config.position)?.clone();
        let format = config
            .format
            .clone()
            .unwrap_or_else(|| select_format(&device));

        log::info!(
            "opening capture session: {} device '{}' at {}x{}@{}",
            config.position.as_str(),
            device.name,
            format.width,
            format.height,
            format.fps
        );

        let params = CameraInitParams::new(device.id.clone()).with_format(format.clone());
        let camera = PlatformCamera::new(params)?;

        let BufferPolicy::DropOldest { capacity } = config.buffer_policy;

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState::Open),
                camera: Mutex::new(Some(camera)),
                device: Mutex::new(device),
                position: Mutex::new(config.position),
                format: Mutex::new(format),
                queue: FrameQueue::new(capacity),
                clock: PtsClock::new(),
                next_sequence: Mutex::new(1),
                capture_thread: Mutex::new(None),
                stop_flag: Arc::new(AtomicBool::new(false)),
            }),
        })
    }

    /// Start the capture thread.
    pub fn start(&self) -> Result<(), ClipError> {
        let mut state = self.inner.state.lock().expect("lock poisoned");
        match *state {
            SessionState::Closed => {
                return Err(ClipError::Stream("session is closed".to_string()))
            }
            SessionState::Started => {
                return Err(ClipError::Stream("session already started".to_string()))
            }
            SessionState::Open | SessionState::Stopped => {}
        }

        self.inner.stop_flag.store(false, Ordering::Relaxed);

        let inner = self.inner.clone();
        let handle = std::thread::Builder::new()
            .name("clipreel-capture".to_string())
            .spawn(move || capture_loop(inner))
            .map_err(|e| ClipError::Stream(format!("spawn failed: {e}")))?;

        *self.inner.capture_thread.lock().expect("lock poisoned") = Some(handle);
        *state = SessionState::Started;
        drop(state);

        // Camera warmup: wait for (and discard) the first frame so
        // callers see a ready stream.
        let warmup_start = Instant::now();
        while warmup_start.elapsed() < Duration::from_secs(5) {
            if let Ok(Some(_)) = self.inner.queue.pop_timeout(Duration::from_millis(100)) {
                break;
            }
        }

        Ok(())
    }

    /// Stop the capture thread, joining it with a timeout.
    pub fn stop(&self, join_timeout: Duration) -> Result<(), ClipError> {
        {
            let state = self.inner.state.lock().expect("lock poisoned");
            match *state {
                SessionState::Closed => {
                    return Err(ClipError::Stream("session is closed".to_string()))
                }
                SessionState::Stopped | SessionState::Open => {
                    return Err(ClipError::Stream("session is not started".to_string()))
                }
                SessionState::Started => {}
            }
        }

        self.inner.stop_flag.store(true, Ordering::Relaxed);

        let join_handle = self
            .inner
            .capture_thread
            .lock()
            .expect("lock poisoned")
            .take();

        if let Some(handle) = join_handle {
            let start = Instant::now();
            let mut handle = Some(handle);
            loop {
                if handle.as_ref().is_some_and(|h| h.is_finished()) {
                    let _ = handle.take().map(|h| h.join());
                    break;
                }
                if start.elapsed() >= join_timeout {
                    // Keep the handle so a later stop/close can retry.
                    *self.inner.capture_thread.lock().expect("lock poisoned") = handle.take();
                    return Err(ClipError::Stream("timed out joining capture thread".to_string()));
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        }

        let mut state = self.inner.state.lock().expect("lock poisoned");
        if *state != SessionState::Closed {
            *state = SessionState::Stopped;
        }
        Ok(())
    }

    /// Stop if needed, close the queue, and release the camera.
    pub fn close(&self, join_timeout: Duration) -> Result<(), ClipError> {
        {
            let state = *self.inner.state.lock().expect("lock poisoned");
            if state == SessionState::Closed {
                return Err(ClipError::Stream("session is closed".to_string()));
            }
        }

        if let Err(e) = self.stop(join_timeout) {
            log::debug!("stop during close: {}", e);
        }

        self.inner.queue.close();
        *self.inner.camera.lock().expect("lock poisoned") = None;
        *self.inner.state.lock().expect("lock poisoned") = SessionState::Closed;
        Ok(())
    }

    /// Pop the next frame, waiting up to `timeout`.
    pub fn next_frame(&self, timeout: Duration) -> Result<Option<CameraFrame>, ClipError> {
        let state = *self.inner.state.lock().expect("lock poisoned");
        match state {
            SessionState::Closed => return Err(ClipError::Stream("session is closed".to_string())),
            SessionState::Stopped => {
                return Err(ClipError::Stream("session is stopped".to_string()))
            }
            SessionState::Open => {
                return Err(ClipError::Stream("session not started".to_string()))
            }
            SessionState::Started => {}
        }
        self.inner.queue.pop_timeout(timeout)
    }

    /// Switch to a different lens position.
    ///
    /// The replacement device is opened first; if that fails the old
    /// input is kept and the stream resumes untouched. Valid in any
    /// non-closed state.
    pub fn switch_position(&self, position: CameraPosition) -> Result<(), ClipError> {
        if *self.inner.position.lock().expect("lock poisoned") == position {
            return Ok(());
        }

        let was_started =
            *self.inner.state.lock().expect("lock poisoned") == SessionState::Started;
        if was_started {
            self.stop(Duration::from_secs(2))?;
        }

        let result = self.rebuild_input(position);

        if was_started {
            // Restart regardless: on failure this resumes the old input.
            self.start()?;
        }
        result
    }

    fn rebuild_input(&self, position: CameraPosition) -> Result<(), ClipError> {
        let devices = platform::list_cameras()?;
        let device = select_device(&devices, position)?.clone();
        let format = select_format(&device);

        let params = CameraInitParams::new(device.id.clone()).with_format(format.clone());
        match PlatformCamera::new(params) {
            Ok(new_camera) => {
                *self.inner.camera.lock().expect("lock poisoned") = Some(new_camera);
                *self.inner.device.lock().expect("lock poisoned") = device;
                *self.inner.format.lock().expect("lock poisoned") = format;
                *self.inner.position.lock().expect("lock poisoned") = position;
                log::info!("switched camera position to {}", position.as_str());
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "camera switch to {} failed, keeping current input: {}",
                    position.as_str(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Frames evicted from the queue before being consumed
    pub fn dropped_frames(&self) -> u64 {
        self.inner.queue.dropped()
    }

    pub fn position(&self) -> CameraPosition {
        *self.inner.position.lock().expect("lock poisoned")
    }

    pub fn device(&self) -> CameraDeviceInfo {
        self.inner.device.lock().expect("lock poisoned").clone()
    }

    pub fn format(&self) -> CameraFormat {
        self.inner.format.lock().expect("lock poisoned").clone()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.lock().expect("lock poisoned")
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            if let Err(e) = self.close(Duration::from_millis(100)) {
                log::debug!("closing session in drop: {}", e);
            }
        }
    }
}

fn capture_loop(inner: Arc<Inner>) {
    let mut camera = match inner.camera.lock().expect("lock poisoned").take() {
        Some(cam) => cam,
        None => return,
    };

    let _ = camera.start_stream();

    loop {
        if inner.stop_flag.load(Ordering::Relaxed) {
            break;
        }

        match camera.capture_frame() {
            Ok(frame) => {
                let stamped = stamp_frame(&inner, frame);
                inner.queue.push_drop_oldest(stamped);
            }
            Err(e) => {
                // Device failure ends the stream; readers see a closed
                // queue.
                log::error!("capture failed, closing stream: {}", e);
                inner.queue.close();
                break;
            }
        }
    }

    let _ = camera.stop_stream();

    // Hand the camera back so the session can restart or switch inputs.
    *inner.camera.lock().expect("lock poisoned") = Some(camera);
}

fn stamp_frame(inner: &Inner, frame: CameraFrame) -> CameraFrame {
    let sequence = {
        let mut g = inner.next_sequence.lock().expect("lock poisoned");
        let v = *g;
        *g = g.saturating_add(1);
        v
    };
    frame.with_stamp(sequence, inner.clock.timestamp_us())
}
