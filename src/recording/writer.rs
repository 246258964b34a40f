//! Per-clip MP4 writing
//!
//! One `ClipWriter` owns one clip file exclusively, from creation to
//! `finish`. Frames are placed at clip-relative timestamps: the first
//! frame's capture timestamp becomes the clip's time zero.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use muxide::api::{Metadata, MuxerBuilder, VideoCodec};

use super::config::{RecordingConfig, Rotation};
use super::encoder::ClipEncoder;
use crate::errors::ClipError;
use crate::timing::MediaTime;
use crate::types::{CameraFrame, Clip};

/// What happened to an appended frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    /// Frame was encoded and muxed
    Written,
    /// Writer could not accept the frame; it was dropped and counted
    Dropped,
}

impl FrameDisposition {
    pub fn is_written(&self) -> bool {
        matches!(self, FrameDisposition::Written)
    }
}

/// Writer for a single clip file
pub struct ClipWriter {
    encoder: ClipEncoder,
    muxer: muxide::api::Muxer<BufWriter<File>>,
    config: RecordingConfig,
    path: PathBuf,
    zero_time_us: Option<u64>,
    last_rel_us: Option<u64>,
    frames_written: u64,
    frames_dropped: u64,
}

impl ClipWriter {
    pub fn new<P: AsRef<Path>>(path: P, config: RecordingConfig) -> Result<Self, ClipError> {
        let path = path.as_ref().to_path_buf();

        let file = File::create(&path)
            .map_err(|e| ClipError::Io(format!("Failed to create clip file: {}", e)))?;
        let writer = BufWriter::new(file);

        // Encoder and muxer see post-rotation geometry.
        let (out_width, out_height) = config.output_dimensions();
        let encoder = ClipEncoder::new(out_width, out_height, config.fps, config.bitrate)?;

        let mut builder = MuxerBuilder::new(writer)
            .video(VideoCodec::H264, out_width, out_height, config.fps)
            .with_fast_start(config.fast_start);

        let metadata = match config.title {
            Some(ref title) => Metadata::new().with_title(title).with_current_time(),
            None => Metadata::new().with_current_time(),
        };
        builder = builder.with_metadata(metadata);

        let muxer = builder
            .build()
            .map_err(|e| ClipError::Muxing(format!("Failed to create muxer: {}", e)))?;

        Ok(Self {
            encoder,
            muxer,
            config,
            path,
            zero_time_us: None,
            last_rel_us: None,
            frames_written: 0,
            frames_dropped: 0,
        })
    }

    /// Append a frame at its clip-relative offset.
    ///
    /// The first accepted frame defines time zero. A frame whose offset
    /// does not advance past the previous one, or for which the encoder
    /// emits no data, is dropped and counted; the clip keeps going.
    pub fn append(&mut self, frame: &CameraFrame) -> Result<FrameDisposition, ClipError> {
        if frame.width != self.config.width || frame.height != self.config.height {
            return Err(ClipError::Encoding(format!(
                "Frame dimensions {}x{} don't match recording config {}x{}",
                frame.width, frame.height, self.config.width, self.config.height
            )));
        }

        let zero = *self.zero_time_us.get_or_insert(frame.timestamp_us);
        let rel_us = frame.timestamp_us.saturating_sub(zero);

        if let Some(last) = self.last_rel_us {
            if rel_us <= last {
                self.frames_dropped += 1;
                log::debug!(
                    "clip {}: dropped frame at {}us (last accepted {}us)",
                    self.path.display(),
                    rel_us,
                    last
                );
                return Ok(FrameDisposition::Dropped);
            }
        }

        let rotated = rotate_rgb(&frame.data, frame.width, frame.height, self.config.rotation)?;
        let chunk = self.encoder.encode_rgb(&rotated)?;

        if chunk.data.is_empty() {
            self.frames_dropped += 1;
            return Ok(FrameDisposition::Dropped);
        }

        let pts = rel_us as f64 / 1_000_000.0;
        self.muxer
            .write_video(pts, &chunk.data, chunk.keyframe)
            .map_err(|e| ClipError::Muxing(format!("Failed to write frame: {}", e)))?;

        self.frames_written += 1;
        self.last_rel_us = Some(rel_us);

        Ok(FrameDisposition::Written)
    }

    /// Finalize the file and return the immutable clip.
    ///
    /// Duration covers the accepted frames' span only: the last accepted
    /// offset plus one nominal frame period.
    pub fn finish(self) -> Result<Clip, ClipError> {
        self.muxer
            .finish_with_stats()
            .map_err(|e| ClipError::Muxing(format!("Failed to finalize clip: {}", e)))?;

        let duration = match self.last_rel_us {
            Some(last) => {
                let period_us = (1_000_000.0 / self.config.fps).round() as u64;
                MediaTime::from_micros(last + period_us)
            }
            None => MediaTime::zero(),
        };

        log::info!(
            "finalized clip {}: {} frames ({} dropped), {:.2}s",
            self.path.display(),
            self.frames_written,
            self.frames_dropped,
            duration.as_seconds()
        );

        Ok(Clip::new(self.path, duration, self.frames_written))
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Whether time zero has been established by a first frame
    pub fn is_started(&self) -> bool {
        self.zero_time_us.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Force the next accepted frame to be a keyframe
    pub fn force_keyframe(&mut self) {
        self.encoder.force_keyframe();
    }
}

/// Quarter-turn rotation of an RGB24 buffer
fn rotate_rgb(data: &[u8], width: u32, height: u32, rotation: Rotation) -> Result<Vec<u8>, ClipError> {
    if rotation == Rotation::None {
        return Ok(data.to_vec());
    }

    let img = image::RgbImage::from_raw(width, height, data.to_vec())
        .ok_or_else(|| ClipError::Encoding("Frame buffer does not match dimensions".to_string()))?;

    let rotated = match rotation {
        Rotation::Clockwise90 => image::imageops::rotate90(&img),
        Rotation::Clockwise180 => image::imageops::rotate180(&img),
        Rotation::Clockwise270 => image::imageops::rotate270(&img),
        Rotation::None => img,
    };

    Ok(rotated.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn test_frame(gray: u8, width: u32, height: u32, ts_us: u64) -> CameraFrame {
        CameraFrame::new(vec![gray; (width * height * 3) as usize], width, height, "cam0".into())
            .with_stamp(0, ts_us)
    }

    #[test]
    fn writer_creation() {
        let output = temp_dir().join("clipreel_writer_create.mp4");
        let config = RecordingConfig::new(320, 240, 30.0);
        assert!(ClipWriter::new(&output, config).is_ok());
        let _ = std::fs::remove_file(&output);
    }

    #[test]
    fn relative_timestamps_start_at_zero() {
        let output = temp_dir().join("clipreel_writer_rel.mp4");
        let config = RecordingConfig::new(320, 240, 30.0);
        let mut writer = ClipWriter::new(&output, config).expect("writer");

        // Zero time comes from the first frame, not the session start.
        for i in 0..5u64 {
            let frame = test_frame((i * 40) as u8, 320, 240, 9_000_000 + i * 33_333);
            assert!(writer.append(&frame).expect("append").is_written());
        }

        let clip = writer.finish().expect("finish");
        assert_eq!(clip.frames, 5);
        // 4 * 33_333us span + one 33_333us period ~= 166ms
        assert!((clip.duration.as_seconds() - 0.1667).abs() < 0.01);
        let _ = std::fs::remove_file(clip.path);
    }

    #[test]
    fn non_advancing_frame_is_dropped_not_fatal() {
        let output = temp_dir().join("clipreel_writer_drop.mp4");
        let config = RecordingConfig::new(320, 240, 30.0);
        let mut writer = ClipWriter::new(&output, config).expect("writer");

        assert!(writer.append(&test_frame(10, 320, 240, 1_000)).unwrap().is_written());
        assert!(writer.append(&test_frame(20, 320, 240, 34_333)).unwrap().is_written());
        // Stale timestamp: rejected, counted, clip continues.
        assert_eq!(
            writer.append(&test_frame(30, 320, 240, 34_333)).unwrap(),
            FrameDisposition::Dropped
        );
        assert!(writer.append(&test_frame(40, 320, 240, 67_666)).unwrap().is_written());

        assert_eq!(writer.frames_written(), 3);
        assert_eq!(writer.frames_dropped(), 1);

        let clip = writer.finish().expect("finish");
        assert_eq!(clip.frames, 3);
        let _ = std::fs::remove_file(clip.path);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let output = temp_dir().join("clipreel_writer_dims.mp4");
        let config = RecordingConfig::new(320, 240, 30.0);
        let mut writer = ClipWriter::new(&output, config).expect("writer");

        let wrong = test_frame(0, 640, 480, 0);
        assert!(writer.append(&wrong).is_err());
        let _ = std::fs::remove_file(&output);
    }

    #[test]
    fn rotation_rotates_buffer() {
        // 2x1 red/green becomes 1x2 under a quarter turn.
        let data = vec![255, 0, 0, 0, 255, 0];
        let out = rotate_rgb(&data, 2, 1, Rotation::Clockwise90).expect("rotate");
        assert_eq!(out.len(), 6);
        assert_eq!(&out[0..3], &[255, 0, 0]);
    }

    #[test]
    fn portrait_writer_accepts_landscape_frames() {
        let output = temp_dir().join("clipreel_writer_portrait.mp4");
        let config = RecordingConfig::new(320, 240, 30.0).portrait();
        let mut writer = ClipWriter::new(&output, config).expect("writer");

        let frame = test_frame(128, 320, 240, 0);
        assert!(writer.append(&frame).expect("append").is_written());

        let clip = writer.finish().expect("finish");
        let _ = std::fs::remove_file(clip.path);
    }
}
