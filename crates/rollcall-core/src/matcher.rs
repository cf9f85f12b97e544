//! Nearest-neighbor signature matching against the enrolled gallery.

use crate::types::{IdentityMeta, IdentityRecord, Signature};

/// Default acceptance threshold for Euclidean distance between
/// signatures, calibrated for the encoder that produced the enrolled
/// vectors. Callers may override per session.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;

/// One matchable unit: a single signature sample with the identity it
/// belongs to. An identity with N samples contributes N entries.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub meta: IdentityMeta,
    pub signature: Signature,
}

/// In-memory match index: an ordered sequence of `(meta, signature)`
/// pairs. Rebuilt from the store on every load; entry order carries no
/// meaning beyond tie-breaking determinism within one snapshot.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    /// Flatten enrolled records into the match index, repeating each
    /// identity's metadata once per signature sample.
    pub fn from_records(records: &[IdentityRecord]) -> Self {
        let mut entries = Vec::new();
        for record in records {
            let meta = record.meta();
            for signature in &record.signatures {
                entries.push(GalleryEntry {
                    meta: meta.clone(),
                    signature: signature.clone(),
                });
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of matching one probe signature against the gallery.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchDecision {
    /// Best entry was within the acceptance threshold.
    Matched { meta: IdentityMeta, distance: f32 },
    /// A non-empty gallery had no entry close enough.
    Unmatched { best_distance: f32 },
    /// No one is enrolled; distinct from "no one matched".
    EmptyGallery,
}

impl MatchDecision {
    pub fn matched_meta(&self) -> Option<&IdentityMeta> {
        match self {
            MatchDecision::Matched { meta, .. } => Some(meta),
            _ => None,
        }
    }
}

/// Strategy for comparing a probe signature against the gallery.
pub trait Matcher {
    fn compare(&self, probe: &Signature, gallery: &Gallery, threshold: f32) -> MatchDecision;
}

/// Euclidean nearest-neighbor matcher.
///
/// Scans every gallery entry and accepts the nearest one iff its
/// distance is at or below the threshold (inclusive rule, matching the
/// encoder library's own tolerance comparison). Ties keep the lowest
/// index, so repeated calls on the same snapshot are reproducible.
pub struct EuclideanMatcher;

impl Matcher for EuclideanMatcher {
    fn compare(&self, probe: &Signature, gallery: &Gallery, threshold: f32) -> MatchDecision {
        if gallery.is_empty() {
            return MatchDecision::EmptyGallery;
        }

        let mut best_distance = f32::INFINITY;
        let mut best_idx = 0usize;

        for (i, entry) in gallery.entries().iter().enumerate() {
            let distance = probe.euclidean_distance(&entry.signature);
            // Strict `<` keeps the first of equally-minimal entries.
            if distance < best_distance {
                best_distance = distance;
                best_idx = i;
            }
        }

        if best_distance <= threshold {
            MatchDecision::Matched {
                meta: gallery.entries()[best_idx].meta.clone(),
                distance: best_distance,
            }
        } else {
            MatchDecision::Unmatched { best_distance }
        }
    }
}
