//! Timeline placement for concatenation
//!
//! A timeline maps each clip to a half-open interval on the output
//! movie's time axis, in clip-list order, by accumulating rational
//! durations. Consecutive intervals have zero gap and zero overlap.

use crate::timing::MediaTime;
use crate::types::{Clip, ClipList};
use serde::Serialize;

/// One clip's placement on the output time axis
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub clip: Clip,
    /// Interval start: the sum of all preceding clips' durations
    pub start: MediaTime,
    pub duration: MediaTime,
}

impl TimelineEntry {
    /// Exclusive interval end
    pub fn end(&self) -> MediaTime {
        self.start.add(self.duration)
    }
}

/// Derived placement of a clip list; discarded after export
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Place every clip immediately after the previous clip's end.
    pub fn from_clips(clips: &ClipList) -> Self {
        let mut entries = Vec::with_capacity(clips.len());
        let mut insert_time = MediaTime::zero();

        for clip in clips.iter() {
            entries.push(TimelineEntry {
                clip: clip.clone(),
                start: insert_time,
                duration: clip.duration,
            });
            insert_time = insert_time.add(clip.duration);
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// End of the last interval; zero for an empty timeline.
    pub fn total_duration(&self) -> MediaTime {
        self.entries
            .last()
            .map(|e| e.end())
            .unwrap_or_else(MediaTime::zero)
    }
}
