//! Property-Based Tests for the clipreel timeline
//!
//! These tests verify the placement invariants of clip concatenation
//! using proptest for input generation and shrinking.
//!
//! Run with: cargo test --test timeline_props

use proptest::prelude::*;

use clipreel::concat::Timeline;
use clipreel::timing::MediaTime;
use clipreel::types::{Clip, ClipList};

fn clip_list(durations_600: &[i64]) -> ClipList {
    ClipList::from(
        durations_600
            .iter()
            .enumerate()
            .map(|(i, &d)| Clip::new(format!("clip_{i}.mp4").into(), MediaTime::new(d, 600), 1))
            .collect::<Vec<_>>(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// TIMELINE PLACEMENT INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// INVARIANT: Total duration equals the rational sum of clip durations
    #[test]
    fn total_duration_is_sum_of_clips(
        durations in prop::collection::vec(1i64..100_000, 1..50),
    ) {
        let clips = clip_list(&durations);
        let timeline = Timeline::from_clips(&clips);

        let expected = MediaTime::new(durations.iter().sum(), 600);
        prop_assert_eq!(timeline.total_duration(), expected);
        prop_assert_eq!(timeline.total_duration(), clips.total_duration());
    }

    /// INVARIANT: Entry N starts at the sum of durations 0..N-1
    #[test]
    fn entry_start_is_prefix_sum(
        durations in prop::collection::vec(1i64..100_000, 1..50),
    ) {
        let timeline = Timeline::from_clips(&clip_list(&durations));

        let mut prefix = 0i64;
        for (entry, d) in timeline.entries().iter().zip(durations.iter()) {
            prop_assert_eq!(entry.start, MediaTime::new(prefix, 600));
            prefix += d;
        }
    }

    /// INVARIANT: Consecutive intervals have zero gap and zero overlap
    #[test]
    fn zero_gap_zero_overlap(
        durations in prop::collection::vec(1i64..100_000, 2..50),
    ) {
        let timeline = Timeline::from_clips(&clip_list(&durations));

        for pair in timeline.entries().windows(2) {
            prop_assert_eq!(pair[0].end(), pair[1].start);
        }
    }

    /// INVARIANT: Placement preserves clip-list order
    #[test]
    fn placement_preserves_order(
        durations in prop::collection::vec(1i64..100_000, 1..50),
    ) {
        let clips = clip_list(&durations);
        let timeline = Timeline::from_clips(&clips);

        prop_assert_eq!(timeline.len(), clips.len());
        for (entry, clip) in timeline.entries().iter().zip(clips.iter()) {
            prop_assert_eq!(&entry.clip.path, &clip.path);
        }
    }

    /// INVARIANT: Rebuilding the timeline is deterministic
    #[test]
    fn timeline_is_idempotent(
        durations in prop::collection::vec(1i64..100_000, 1..30),
    ) {
        let clips = clip_list(&durations);
        let a = Timeline::from_clips(&clips);
        let b = Timeline::from_clips(&clips);

        prop_assert_eq!(a.total_duration(), b.total_duration());
        for (x, y) in a.entries().iter().zip(b.entries().iter()) {
            prop_assert_eq!(x.start, y.start);
            prop_assert_eq!(x.duration, y.duration);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MEDIA TIME INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// INVARIANT: Addition at a shared timescale is exact and associative
    #[test]
    fn media_time_add_associative(
        a in 0i64..1_000_000,
        b in 0i64..1_000_000,
        c in 0i64..1_000_000,
    ) {
        let (ta, tb, tc) = (
            MediaTime::new(a, 600),
            MediaTime::new(b, 600),
            MediaTime::new(c, 600),
        );
        prop_assert_eq!(ta.add(tb).add(tc), ta.add(tb.add(tc)));
        prop_assert_eq!(ta.add(tb).value(), a + b);
    }

    /// INVARIANT: Frame-count durations concatenate exactly
    #[test]
    fn frame_durations_concatenate(
        frames_a in 1u64..10_000,
        frames_b in 1u64..10_000,
        fps in prop::sample::select(vec![24.0f64, 25.0, 30.0, 60.0]),
    ) {
        let sum = MediaTime::from_frames(frames_a, fps)
            .add(MediaTime::from_frames(frames_b, fps));
        prop_assert_eq!(sum, MediaTime::from_frames(frames_a + frames_b, fps));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn scenario_two_plus_three_seconds() {
    let clips = ClipList::from(vec![
        Clip::new("clip_a.mp4".into(), MediaTime::from_seconds(2.0), 60),
        Clip::new("clip_b.mp4".into(), MediaTime::from_seconds(3.0), 90),
    ]);
    let timeline = Timeline::from_clips(&clips);

    assert_eq!(timeline.total_duration().as_seconds(), 5.0);
    assert_eq!(timeline.entries()[1].start.as_seconds(), 2.0);
}

#[test]
fn scenario_single_clip_starts_at_zero() {
    let clips = ClipList::from(vec![Clip::new(
        "only.mp4".into(),
        MediaTime::from_seconds(1.25),
        38,
    )]);
    let timeline = Timeline::from_clips(&clips);

    assert!(timeline.entries()[0].start.is_zero());
    assert_eq!(timeline.total_duration(), MediaTime::from_seconds(1.25));
}
