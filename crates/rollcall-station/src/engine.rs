//! Enrollment and recognition loops.
//!
//! Both loops are strictly sequential per frame: acquire, extract,
//! then act, before the next frame is pulled. Only the post-mark
//! notification leaves the loop, dispatched fire-and-forget on its
//! own thread so a slow display surface can never stall frame
//! acquisition.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use uuid::Uuid;

use rollcall_core::capture::{CaptureError, FrameSource, Notifier, SignatureExtractor};
use rollcall_core::types::Signature;
use rollcall_core::{
    AttendanceLedger, EuclideanMatcher, Gallery, MarkOutcome, MatchDecision, Matcher,
    SessionTracker,
};

const MARKED_NOTIFICATION: &str = "Attendance Marked Successfully";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    #[error("no face captured during enrollment")]
    NoFaceCaptured,
}

/// Counters reported when a recognition session ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOutcome {
    pub frames_processed: u64,
    pub faces_seen: u64,
    pub marked: usize,
    pub already_marked: usize,
}

/// Parameters for one recognition session.
pub struct SessionParams {
    pub subject: String,
    pub threshold: f32,
    pub notify_duration: Duration,
}

/// Run the recognition loop until the source ends, the stop flag is
/// raised, or frame acquisition fails.
///
/// Per frame: every detected face is matched independently against the
/// same gallery snapshot; a confirmed new identity is written to the
/// ledger. Missing faces, unknown faces, and duplicate marks are
/// logged and never end the session; camera failure does.
pub fn run_session<S, X>(
    source: &mut S,
    extractor: &mut X,
    gallery: &Gallery,
    tracker: &mut SessionTracker,
    ledger: &AttendanceLedger,
    notifier: Arc<dyn Notifier>,
    params: &SessionParams,
    stop: &AtomicBool,
) -> Result<SessionOutcome, EngineError>
where
    S: FrameSource,
    X: SignatureExtractor,
{
    let session = Uuid::new_v4();
    tracing::info!(
        %session,
        subject = %params.subject,
        threshold = params.threshold,
        enrolled_signatures = gallery.len(),
        "recognition session started"
    );
    if gallery.is_empty() {
        tracing::warn!(%session, "gallery is empty; every face will go unmatched");
    }

    let matcher = EuclideanMatcher;
    let mut outcome = SessionOutcome::default();

    while !stop.load(Ordering::Relaxed) {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(CaptureError::StreamEnded) => {
                tracing::info!(%session, "frame source ended");
                break;
            }
            Err(err) => {
                tracing::error!(%session, error = %err, "frame acquisition failed; ending session");
                return Err(err.into());
            }
        };
        outcome.frames_processed += 1;

        let detections = extractor.capture_signatures(&frame);
        if detections.is_empty() {
            tracing::trace!(%session, frame = frame.seq, "no face detected");
            continue;
        }

        for (_, signature) in detections {
            outcome.faces_seen += 1;
            match matcher.compare(&signature, gallery, params.threshold) {
                MatchDecision::Matched { meta, distance } => {
                    tracing::debug!(
                        %session,
                        enrollment = %meta.enrollment_id,
                        distance,
                        "face matched"
                    );
                    if tracker.is_confirmed(&meta.enrollment_id) {
                        continue;
                    }
                    // Confirm only after the ledger accepted the mark,
                    // so a failed write is retried on the next sighting.
                    match ledger.mark(&meta, &params.subject, Local::now()) {
                        Ok(MarkOutcome::Marked) => {
                            tracker.confirm(&meta.enrollment_id);
                            outcome.marked += 1;
                            dispatch_notification(
                                Arc::clone(&notifier),
                                MARKED_NOTIFICATION.to_string(),
                                params.notify_duration,
                            );
                        }
                        Ok(MarkOutcome::AlreadyMarked) => {
                            tracker.confirm(&meta.enrollment_id);
                            outcome.already_marked += 1;
                        }
                        Err(err) => {
                            tracing::error!(
                                %session,
                                enrollment = %meta.enrollment_id,
                                error = %err,
                                "ledger write failed; will retry on next sighting"
                            );
                        }
                    }
                }
                MatchDecision::Unmatched { best_distance } => {
                    tracing::debug!(%session, best_distance, "unknown face");
                }
                MatchDecision::EmptyGallery => {
                    tracing::trace!(%session, "no identities enrolled");
                }
            }
        }
    }

    tracing::info!(
        %session,
        frames = outcome.frames_processed,
        marked = outcome.marked,
        "recognition session ended"
    );
    Ok(outcome)
}

/// Run the enrollment capture loop: collect the first detected face's
/// signature from each frame until `target_samples` are gathered, the
/// source ends, or the stop flag is raised.
///
/// Returns whatever was collected; an aborted session with some
/// samples still enrolls (matching capture-station practice), but zero
/// samples is an error and nothing is persisted.
pub fn run_enroll<S, X>(
    source: &mut S,
    extractor: &mut X,
    target_samples: usize,
    stop: &AtomicBool,
) -> Result<Vec<Signature>, EngineError>
where
    S: FrameSource,
    X: SignatureExtractor,
{
    let mut collected = Vec::new();

    while collected.len() < target_samples && !stop.load(Ordering::Relaxed) {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(CaptureError::StreamEnded) => {
                tracing::info!(collected = collected.len(), "frame source ended during enrollment");
                break;
            }
            Err(err) => return Err(err.into()),
        };

        match extractor.capture_signatures(&frame).into_iter().next() {
            Some((_, signature)) => {
                collected.push(signature);
                tracing::info!(
                    captured = collected.len(),
                    target = target_samples,
                    "sample captured"
                );
            }
            None => {
                tracing::debug!(frame = frame.seq, "no face detected; sample skipped");
            }
        }
    }

    if collected.is_empty() {
        return Err(EngineError::NoFaceCaptured);
    }
    Ok(collected)
}

fn dispatch_notification(notifier: Arc<dyn Notifier>, message: String, duration: Duration) {
    std::thread::spawn(move || {
        notifier.notify(&message, duration);
    });
}
