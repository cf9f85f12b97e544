//! Replay capture backend: frames and pre-computed signatures loaded
//! from a JSON file instead of a live camera.
//!
//! This is the integration point for a real capture pipeline — any
//! backend that produces `(FrameSource, SignatureExtractor)` plugs
//! into the same loops. Replay files are what station operators use
//! for dry runs and what the engine tests drive the loops with.
//!
//! File format: a JSON array of frames; each frame is an array of
//! signature vectors (one per face detected in that frame):
//! `[[[0.1, 0.2, ...]], [], [[...], [...]]]`.

use std::path::Path;

use thiserror::Error;

use rollcall_core::capture::{CaptureError, Frame, FrameSource, SignatureExtractor};
use rollcall_core::types::{BoundingBox, Signature};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read replay file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed replay file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Yields one empty-pixel frame per replay entry, then
/// [`CaptureError::StreamEnded`].
pub struct ReplaySource {
    total: u64,
    next: u64,
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        if self.next >= self.total {
            return Err(CaptureError::StreamEnded);
        }
        let frame = Frame {
            seq: self.next,
            width: 0,
            height: 0,
            data: Vec::new(),
        };
        self.next += 1;
        Ok(frame)
    }
}

/// Serves the recorded signatures for each frame by sequence number.
pub struct ReplayExtractor {
    frames: Vec<Vec<Signature>>,
}

impl SignatureExtractor for ReplayExtractor {
    fn capture_signatures(&mut self, frame: &Frame) -> Vec<(BoundingBox, Signature)> {
        let empty_box = BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        };
        self.frames
            .get(frame.seq as usize)
            .map(|signatures| {
                signatures
                    .iter()
                    .map(|s| (empty_box, s.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Build a replay capture pair from recorded per-frame signatures.
pub fn from_frames(frames: Vec<Vec<Signature>>) -> (ReplaySource, ReplayExtractor) {
    let source = ReplaySource {
        total: frames.len() as u64,
        next: 0,
    };
    (source, ReplayExtractor { frames })
}

/// Load a replay capture pair from a JSON file.
pub fn load(path: &Path) -> Result<(ReplaySource, ReplayExtractor), ReplayError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let vectors: Vec<Vec<Vec<f32>>> =
        serde_json::from_str(&raw).map_err(|source| ReplayError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    let frames = vectors
        .into_iter()
        .map(|frame| frame.into_iter().map(Signature::new).collect())
        .collect();
    Ok(from_frames(frames))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_yields_frames_then_ends() {
        let (mut source, _) = from_frames(vec![vec![], vec![]]);
        assert_eq!(source.next_frame().unwrap().seq, 0);
        assert_eq!(source.next_frame().unwrap().seq, 1);
        assert!(matches!(
            source.next_frame(),
            Err(CaptureError::StreamEnded)
        ));
    }

    #[test]
    fn test_extractor_serves_recorded_signatures() {
        let (mut source, mut extractor) =
            from_frames(vec![vec![Signature::new(vec![1.0, 2.0])], vec![]]);

        let frame = source.next_frame().unwrap();
        let detections = extractor.capture_signatures(&frame);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].1.values, vec![1.0, 2.0]);

        let frame = source.next_frame().unwrap();
        assert!(extractor.capture_signatures(&frame).is_empty());
    }

    #[test]
    fn test_load_from_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("replay.json");
        std::fs::write(&path, r#"[[[0.5, 0.25]], []]"#).unwrap();

        let (mut source, mut extractor) = load(&path).unwrap();
        let frame = source.next_frame().unwrap();
        let detections = extractor.capture_signatures(&frame);
        assert_eq!(detections[0].1.values, vec![0.5, 0.25]);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("replay.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load(&path), Err(ReplayError::Parse { .. })));
    }
}
