//! Lossless export of a clip list into one movie
//!
//! Clips are placed on a rational timeline and joined with a stream
//! copy: no re-encode, zero generation loss, moov up front for
//! progressive playback. The heavy lifting runs through FFmpeg's concat
//! demuxer as an async subprocess.

use super::timeline::Timeline;
use crate::errors::ClipError;
use crate::timing::MediaTime;
use crate::types::{Clip, ClipList};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Where and under what name the output lands.
///
/// The movie is written to `<output_dir>/out_<filename>`.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub output_dir: PathBuf,
    pub filename: String,
}

impl ExportRequest {
    pub fn new(output_dir: PathBuf, filename: impl Into<String>) -> Self {
        Self {
            output_dir,
            filename: filename.into(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("out_{}", self.filename))
    }
}

/// Outcome of a completed export
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub path: PathBuf,
    /// Rational sum of the placed clips' durations
    pub duration: MediaTime,
    /// Number of clips that made it into the output
    pub placed: usize,
    /// Clips omitted because their file was missing or empty
    pub skipped: Vec<PathBuf>,
}

/// Concatenate the clips, in list order, into one movie.
///
/// An empty clip list is an explicit error. Unreadable clips are
/// omitted (logged and reported in the result) and the remaining clips
/// still export; failure of the export itself leaves no partial output.
pub async fn concatenate(
    clips: &ClipList,
    request: &ExportRequest,
) -> Result<ExportResult, ClipError> {
    if clips.is_empty() {
        return Err(ClipError::Concat("Clip list is empty".to_string()));
    }

    let (placed, skipped) = partition_readable(clips);
    for path in &skipped {
        log::warn!("skipping unreadable clip: {}", path.display());
    }
    if placed.is_empty() {
        return Err(ClipError::Concat(
            "No readable clips to concatenate".to_string(),
        ));
    }

    let placed_list = ClipList::from(placed);
    let timeline = Timeline::from_clips(&placed_list);

    std::fs::create_dir_all(&request.output_dir)
        .map_err(|e| ClipError::Io(format!("Failed to create output directory: {}", e)))?;

    let output_path = request.output_path();
    let manifest_path = request
        .output_dir
        .join(format!("{}.concat.txt", request.filename));
    std::fs::write(&manifest_path, concat_manifest(&placed_list))
        .map_err(|e| ClipError::Io(format!("Failed to write concat manifest: {}", e)))?;

    log::info!(
        "concatenating {} clips ({:.2}s) into {}",
        timeline.len(),
        timeline.total_duration().as_seconds(),
        output_path.display()
    );

    let status = run_stream_copy(&manifest_path, &output_path).await;
    let _ = std::fs::remove_file(&manifest_path);

    match status {
        Ok(status) if status.success() => Ok(ExportResult {
            path: output_path,
            duration: timeline.total_duration(),
            placed: timeline.len(),
            skipped,
        }),
        Ok(status) => {
            let _ = std::fs::remove_file(&output_path);
            Err(ClipError::Export(format!(
                "ffmpeg concat exited with {}",
                status
            )))
        }
        Err(e) => {
            let _ = std::fs::remove_file(&output_path);
            Err(e)
        }
    }
}

async fn run_stream_copy(
    manifest: &Path,
    output: &Path,
) -> Result<std::process::ExitStatus, ClipError> {
    Command::new("ffmpeg")
        .arg("-y")
        .args(["-f", "concat", "-safe", "0", "-i"])
        .arg(manifest)
        .args(["-c", "copy", "-movflags", "+faststart"])
        .arg(output)
        .status()
        .await
        .map_err(|e| ClipError::Export(format!("Failed to spawn ffmpeg (is it installed?): {}", e)))
}

/// Contents of the concat demuxer manifest: one `file '<path>'` line per
/// clip, in list order.
pub fn concat_manifest(clips: &ClipList) -> String {
    clips
        .iter()
        .map(|clip| format!("file '{}'", clip.path.to_string_lossy()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split clips into (readable, skipped-paths), preserving order.
fn partition_readable(clips: &ClipList) -> (Vec<Clip>, Vec<PathBuf>) {
    let mut readable = Vec::with_capacity(clips.len());
    let mut skipped = Vec::new();

    for clip in clips.iter() {
        match std::fs::metadata(&clip.path) {
            Ok(meta) if meta.len() > 0 => readable.push(clip.clone()),
            _ => skipped.push(clip.path.clone()),
        }
    }

    (readable, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn clip(path: PathBuf, seconds: f64) -> Clip {
        Clip::new(path, MediaTime::from_seconds(seconds), (seconds * 30.0) as u64)
    }

    #[tokio::test]
    async fn empty_clip_list_is_an_explicit_error() {
        let dir = tempdir().expect("tempdir");
        let request = ExportRequest::new(dir.path().to_path_buf(), "final.mp4");

        let result = concatenate(&ClipList::new(), &request).await;
        assert!(matches!(result, Err(ClipError::Concat(_))));
    }

    #[tokio::test]
    async fn all_clips_unreadable_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let request = ExportRequest::new(dir.path().to_path_buf(), "final.mp4");
        let clips = ClipList::from(vec![clip(dir.path().join("missing.mp4"), 2.0)]);

        let result = concatenate(&clips, &request).await;
        assert!(matches!(result, Err(ClipError::Concat(_))));
    }

    #[test]
    fn manifest_lists_clips_in_order() {
        let clips = ClipList::from(vec![
            clip("/tmp/a.mp4".into(), 1.0),
            clip("/tmp/b.mp4".into(), 2.0),
        ]);

        let manifest = concat_manifest(&clips);
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines, vec!["file '/tmp/a.mp4'", "file '/tmp/b.mp4'"]);
    }

    #[test]
    fn unreadable_clips_are_partitioned_out_in_order() {
        let dir = tempdir().expect("tempdir");

        let good = dir.path().join("good.mp4");
        let mut f = std::fs::File::create(&good).expect("create");
        f.write_all(b"not really an mp4 but nonempty").expect("write");

        let empty = dir.path().join("empty.mp4");
        std::fs::File::create(&empty).expect("create");

        let clips = ClipList::from(vec![
            clip(dir.path().join("missing.mp4"), 1.0),
            clip(good.clone(), 2.0),
            clip(empty.clone(), 3.0),
        ]);

        let (readable, skipped) = partition_readable(&clips);
        assert_eq!(readable.len(), 1);
        assert_eq!(readable[0].path, good);
        assert_eq!(skipped, vec![dir.path().join("missing.mp4"), empty]);
    }

    #[test]
    fn output_path_is_prefixed() {
        let request = ExportRequest::new("/videos".into(), "session.mp4");
        assert_eq!(request.output_path(), PathBuf::from("/videos/out_session.mp4"));
    }
}
