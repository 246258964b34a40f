//! Property-Based Tests for the clipreel recording module
//!
//! These tests exercise the encoder, clip writer, and capture state
//! machine against real files in temporary directories.
//!
//! Run with: cargo test --test recording_props

use proptest::prelude::*;
use tempfile::tempdir;

use clipreel::recording::{ClipEncoder, ClipMachine, ClipWriter, RecordingConfig};
use clipreel::types::CameraFrame;

fn gray_frame(gray: u8, width: u32, height: u32, ts_us: u64) -> CameraFrame {
    CameraFrame::new(
        vec![gray; (width * height * 3) as usize],
        width,
        height,
        "cam0".to_string(),
    )
    .with_stamp(0, ts_us)
}

// ═══════════════════════════════════════════════════════════════════════════
// ENCODER INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// INVARIANT: Encoder accepts 16-aligned dimensions
    #[test]
    fn encoder_accepts_valid_dimensions(
        width in (1u32..120).prop_map(|w| w * 16),
        height in (1u32..68).prop_map(|h| h * 16),
        fps in 15.0f64..60.0,
        bitrate in 500_000u32..10_000_000,
    ) {
        let result = ClipEncoder::new(width, height, fps, bitrate);
        prop_assert!(result.is_ok(), "Encoder should accept {}x{} @ {}fps: {:?}",
            width, height, fps, result.err());
    }

    /// INVARIANT: Encoded frames are valid Annex B and the first is a keyframe
    #[test]
    fn encoded_frames_are_annex_b(
        gray_level in 0u8..255,
    ) {
        let mut encoder = ClipEncoder::new(320, 240, 30.0, 1_000_000)
            .expect("Encoder creation should succeed");

        let rgb = vec![gray_level; 320 * 240 * 3];
        let chunk = encoder.encode_rgb(&rgb).expect("Encoding should succeed");

        prop_assert!(chunk.keyframe, "First frame must be a keyframe");
        if !chunk.data.is_empty() {
            prop_assert!(
                chunk.data.starts_with(&[0, 0, 0, 1]) || chunk.data.starts_with(&[0, 0, 1]),
                "Encoded frame should start with Annex B prefix, got: {:02x?}",
                &chunk.data[..chunk.data.len().min(10)]
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CLIP WRITER INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// INVARIANT: Clip frame count matches the accepted writes
    #[test]
    fn clip_frame_count_matches(
        frame_count in 1u64..20,
    ) {
        let dir = tempdir().expect("tempdir");
        let output = dir.path().join("clip.mp4");

        let config = RecordingConfig::new(320, 240, 30.0);
        let mut writer = ClipWriter::new(&output, config).expect("writer");

        for i in 0..frame_count {
            let frame = gray_frame(((i * 17) % 256) as u8, 320, 240, i * 33_333);
            writer.append(&frame).expect("append");
        }

        let clip = writer.finish().expect("finish");
        prop_assert_eq!(clip.frames, frame_count);
        prop_assert!(clip.path.exists());

        let meta = std::fs::metadata(&clip.path).expect("metadata");
        prop_assert!(meta.len() > 0, "Clip file must have content");
    }

    /// INVARIANT: Clip duration tracks the accepted frames' span
    #[test]
    fn clip_duration_tracks_span(
        frame_count in 2u64..30,
        fps in prop::sample::select(vec![15.0f64, 30.0, 60.0]),
    ) {
        let dir = tempdir().expect("tempdir");
        let output = dir.path().join("clip.mp4");

        let config = RecordingConfig::new(320, 240, fps);
        let mut writer = ClipWriter::new(&output, config).expect("writer");

        let period_us = (1_000_000.0 / fps) as u64;
        for i in 0..frame_count {
            let frame = gray_frame(((i * 11) % 256) as u8, 320, 240, i * period_us);
            writer.append(&frame).expect("append");
        }

        let clip = writer.finish().expect("finish");
        let expected = frame_count as f64 / fps;
        prop_assert!(
            (clip.duration.as_seconds() - expected).abs() < 0.05,
            "Duration mismatch: expected ~{:.3}s, got {:.3}s",
            expected, clip.duration.as_seconds()
        );
    }

    /// INVARIANT: Rejected frames never abort a clip
    #[test]
    fn rejected_frames_do_not_abort(
        stale_index in 1u64..9,
    ) {
        let dir = tempdir().expect("tempdir");
        let output = dir.path().join("clip.mp4");

        let config = RecordingConfig::new(320, 240, 30.0);
        let mut writer = ClipWriter::new(&output, config).expect("writer");

        // 10 frames, one of which re-uses the previous timestamp.
        let mut accepted = 0u64;
        let mut ts = 0u64;
        for i in 0..10u64 {
            if i != stale_index {
                ts += 33_333;
            }
            let frame = gray_frame((i * 23) as u8, 320, 240, ts);
            writer.append(&frame).expect("append never errors on staleness");
            if i != stale_index {
                accepted += 1;
            }
        }

        prop_assert_eq!(writer.frames_written(), accepted);
        prop_assert_eq!(writer.frames_dropped(), 1);

        let clip = writer.finish().expect("finish");
        prop_assert_eq!(clip.frames, accepted);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STATE MACHINE TRANSITION TABLE
// ═══════════════════════════════════════════════════════════════════════════

mod machine_transitions {
    use super::*;
    use clipreel::recording::CaptureState;

    #[test]
    fn from_idle_only_start_is_reachable() {
        let dir = tempdir().expect("tempdir");
        let mut machine =
            ClipMachine::new(dir.path().to_path_buf(), RecordingConfig::new(320, 240, 30.0))
                .expect("machine");

        assert_eq!(machine.state(), CaptureState::Idle);
        assert!(machine.request_end().is_err());
        assert!(machine.request_start().is_ok());
    }

    #[test]
    fn from_capturing_only_end_is_reachable() {
        let dir = tempdir().expect("tempdir");
        let mut machine =
            ClipMachine::new(dir.path().to_path_buf(), RecordingConfig::new(320, 240, 30.0))
                .expect("machine");

        machine.request_start().expect("start");
        machine
            .handle_frame(&gray_frame(50, 320, 240, 0))
            .expect("first frame");
        assert_eq!(machine.state(), CaptureState::Capturing);

        assert!(machine.request_start().is_err());
        assert!(machine.request_end().is_ok());
    }

    #[test]
    fn end_always_returns_to_idle_after_finalization() {
        let dir = tempdir().expect("tempdir");
        let mut machine =
            ClipMachine::new(dir.path().to_path_buf(), RecordingConfig::new(320, 240, 30.0))
                .expect("machine");

        machine.request_start().expect("start");
        machine
            .handle_frame(&gray_frame(50, 320, 240, 0))
            .expect("frame");
        machine.request_end().expect("end");
        assert_eq!(machine.state(), CaptureState::End);

        machine.flush().expect("flush");
        assert_eq!(machine.state(), CaptureState::Idle);
        assert_eq!(machine.clips().len(), 1);
    }

    #[test]
    fn idle_frames_are_discarded_without_side_effects() {
        let dir = tempdir().expect("tempdir");
        let mut machine =
            ClipMachine::new(dir.path().to_path_buf(), RecordingConfig::new(320, 240, 30.0))
                .expect("machine");

        for i in 0..5u64 {
            machine
                .handle_frame(&gray_frame(10, 320, 240, i * 33_333))
                .expect("idle frame");
        }
        assert!(machine.clips().is_empty());
        assert_eq!(machine.dropped_frames(), 0);
    }

    #[test]
    fn sequential_clips_reflect_recording_order() {
        let dir = tempdir().expect("tempdir");
        let mut machine =
            ClipMachine::new(dir.path().to_path_buf(), RecordingConfig::new(320, 240, 30.0))
                .expect("machine");

        // Clip A: 2 frames. Clip B: 3 frames.
        machine.request_start().expect("start a");
        machine.handle_frame(&gray_frame(1, 320, 240, 0)).expect("a0");
        machine.handle_frame(&gray_frame(2, 320, 240, 33_333)).expect("a1");
        machine.request_end().expect("end a");
        machine.flush().expect("flush a");

        machine.request_start().expect("start b");
        machine.handle_frame(&gray_frame(3, 320, 240, 1_000_000)).expect("b0");
        machine.handle_frame(&gray_frame(4, 320, 240, 1_033_333)).expect("b1");
        machine.handle_frame(&gray_frame(5, 320, 240, 1_066_666)).expect("b2");
        machine.request_end().expect("end b");
        machine.flush().expect("flush b");

        let clips = machine.clips();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips.as_slice()[0].frames, 2);
        assert_eq!(clips.as_slice()[1].frames, 3);
    }
}
