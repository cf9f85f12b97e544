//! Seams to the external capture pipeline.
//!
//! Frame acquisition, face detection/encoding, and the post-mark
//! notification surface are collaborators, not part of this crate:
//! they are consumed through the traits below. The recognition and
//! enrollment loops are generic over them, which is also what makes
//! those loops testable without hardware.

use std::time::Duration;

use thiserror::Error;

use crate::types::{BoundingBox, Signature};

/// One acquired video frame. `seq` increments per acquisition and lets
/// extractor implementations correlate detections with frames without
/// reparsing pixel data.
#[derive(Debug, Clone)]
pub struct Frame {
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum CaptureError {
    /// Frame acquisition failed; the session cannot continue.
    #[error("camera failure: {0}")]
    Camera(String),
    /// The source has no more frames (end of a replay, operator stop).
    #[error("video stream ended")]
    StreamEnded,
}

/// Blocking source of video frames.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError>;
}

/// Opaque detection + encoding routine: image region in, fixed-length
/// signature vector out, one pair per detected face.
pub trait SignatureExtractor {
    fn capture_signatures(&mut self, frame: &Frame) -> Vec<(BoundingBox, Signature)>;
}

/// Best-effort notification surface for successful marks. Dispatched
/// fire-and-forget off the recognition loop; implementations must not
/// panic and have no way to report back.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, duration: Duration);
}

/// Notifier that writes to the log. Stands in wherever no display
/// surface is attached (headless stations, tests).
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, duration: Duration) {
        tracing::info!(message, duration_ms = duration.as_millis() as u64, "notification");
    }
}
