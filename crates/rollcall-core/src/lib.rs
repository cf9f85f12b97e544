//! rollcall-core — Face matching and attendance ledger engine.
//!
//! Matches face signature vectors against a gallery of enrolled
//! identities and records once-per-subject-per-day attendance marks
//! in durable CSV ledgers.

pub mod capture;
pub mod gallery;
pub mod ledger;
pub mod matcher;
pub mod session;
pub mod types;

pub use gallery::GalleryStore;
pub use ledger::{AttendanceLedger, MarkOutcome};
pub use matcher::{EuclideanMatcher, Gallery, MatchDecision, Matcher, DEFAULT_MATCH_THRESHOLD};
pub use session::SessionTracker;
pub use types::{BoundingBox, IdentityMeta, IdentityRecord, Signature};
