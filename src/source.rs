//! Pose sources consumed by the frame driver.
//!
//! A source yields at most one pose per call. Detection failure is reported as
//! `None`, the same as "nobody in view"; it never aborts the frame loop.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::pose::Pose;

#[async_trait]
pub trait PoseSource: Send {
    /// Grabs the next frame and estimates a pose on it.
    ///
    /// Must be cancel-safe: the driver drops an in-flight call when a command
    /// arrives, and the frame is then simply skipped.
    async fn detect_pose(&mut self) -> Option<Pose>;

    /// Finite sources report `true` once every frame has been handed out.
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Releases camera/model handles. Called once when the driver stops.
    async fn close(&mut self) {}
}

#[async_trait]
impl<S: PoseSource + ?Sized> PoseSource for Box<S> {
    async fn detect_pose(&mut self) -> Option<Pose> {
        (**self).detect_pose().await
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}

/// One line of a recorded stream: `null`, a single pose, or an `estimatePoses` array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Many(Vec<Pose>),
    One(Pose),
}

/// Parses a JSON-lines recording. Blank lines are skipped; unreadable lines
/// become detection failures.
pub fn parse_recording(content: &str) -> Vec<Option<Pose>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| match serde_json::from_str::<Option<ReplayLine>>(line) {
            Ok(Some(ReplayLine::Many(poses))) => Pose::select_primary(poses),
            Ok(Some(ReplayLine::One(pose))) => Some(pose),
            Ok(None) => None,
            Err(e) => {
                warn!(line = i + 1, error = %e, "unreadable pose line, treating as no detection");
                None
            }
        })
        .collect()
}

/// Replays poses recorded as JSON lines, one frame per line.
pub struct ReplaySource {
    path: PathBuf,
    frames: Vec<Option<Pose>>,
    cursor: usize,
    repeat: bool,
}

impl ReplaySource {
    pub fn open<P: AsRef<Path>>(path: P, repeat: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to open pose recording {}", path.display()))?;
        let frames = parse_recording(&content);
        info!(path = %path.display(), frames = frames.len(), repeat, "pose recording loaded");
        Ok(Self {
            path,
            frames,
            cursor: 0,
            repeat,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[async_trait]
impl PoseSource for ReplaySource {
    async fn detect_pose(&mut self) -> Option<Pose> {
        if self.repeat && self.cursor >= self.frames.len() && !self.frames.is_empty() {
            debug!("replay wrapped around");
            self.cursor = 0;
        }
        let frame = self.frames.get(self.cursor).cloned().flatten();
        self.cursor += 1;
        frame
    }

    fn is_exhausted(&self) -> bool {
        if self.repeat {
            self.frames.is_empty()
        } else {
            self.cursor >= self.frames.len()
        }
    }

    async fn close(&mut self) {
        info!(path = %self.path.display(), played = self.cursor, "replay closed");
        self.frames.clear();
        self.cursor = 0;
    }
}

/// In-memory sequence of detections.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Option<Pose>>,
    closed: bool,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = Option<Pose>>>(frames: I) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl PoseSource for ScriptedSource {
    async fn detect_pose(&mut self) -> Option<Pose> {
        self.frames.pop_front().flatten()
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }

    async fn close(&mut self) {
        self.frames.clear();
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NOSE_ONLY: &str = r#"{"keypoints":[{"x":1.0,"y":2.0,"score":0.9,"name":"nose"}]}"#;

    #[test]
    fn test_parse_line_shapes() {
        let content = format!(
            "null\n[]\n{NOSE_ONLY}\n[{NOSE_ONLY}]\n\nnot json\n"
        );
        let frames = parse_recording(&content);
        assert_eq!(frames.len(), 5);
        assert!(frames[0].is_none());
        assert!(frames[1].is_none());
        assert_eq!(frames[2].as_ref().unwrap().keypoints.len(), 1);
        assert_eq!(frames[3].as_ref().unwrap().keypoints[0].y, 2.0);
        assert!(frames[4].is_none());
    }

    #[test]
    fn test_parse_picks_most_confident_pose() {
        let line = r#"[{"keypoints":[],"score":0.2},{"keypoints":[{"x":5.0,"y":5.0,"name":"nose"}],"score":0.7}]"#;
        let frames = parse_recording(line);
        assert_eq!(frames[0].as_ref().unwrap().keypoints.len(), 1);
    }

    #[test]
    fn test_open_missing_file_is_an_error() {
        assert!(ReplaySource::open("/nonexistent/poses.jsonl", false).is_err());
    }

    #[tokio::test]
    async fn test_replay_plays_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{NOSE_ONLY}").unwrap();
        writeln!(file, "null").unwrap();
        let mut source = ReplaySource::open(file.path(), false).unwrap();
        assert_eq!(source.len(), 2);
        assert!(source.detect_pose().await.is_some());
        assert!(!source.is_exhausted());
        assert!(source.detect_pose().await.is_none());
        assert!(source.is_exhausted());
        assert!(source.detect_pose().await.is_none());
    }

    #[tokio::test]
    async fn test_replay_repeat_wraps() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{NOSE_ONLY}").unwrap();
        let mut source = ReplaySource::open(file.path(), true).unwrap();
        for _ in 0..3 {
            assert!(source.detect_pose().await.is_some());
            assert!(!source.is_exhausted());
        }
    }

    #[tokio::test]
    async fn test_scripted_close() {
        let mut source = ScriptedSource::new([None, None]);
        assert!(!source.is_exhausted());
        source.close().await;
        assert!(source.is_closed());
        assert!(source.is_exhausted());
    }
}
