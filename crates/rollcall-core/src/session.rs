//! Per-session dedup state for the recognition loop.

use std::collections::HashSet;

/// Tracks which enrollment ids have already been confirmed during one
/// run of the recognition loop, so the ledger is invoked at most once
/// per identity per session.
///
/// Deliberately an explicit owned object, not process-global state:
/// each session (and each test) constructs its own. Nothing persists
/// across a restart.
#[derive(Debug, Default)]
pub struct SessionTracker {
    confirmed: HashSet<String>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the id as confirmed. Returns true exactly once per
    /// distinct id for the lifetime of this tracker.
    pub fn confirm(&mut self, enrollment_id: &str) -> bool {
        self.confirmed.insert(enrollment_id.to_string())
    }

    pub fn is_confirmed(&self, enrollment_id: &str) -> bool {
        self.confirmed.contains(enrollment_id)
    }

    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_true_exactly_once() {
        let mut tracker = SessionTracker::new();
        assert!(tracker.confirm("E1"));
        for _ in 0..50 {
            assert!(!tracker.confirm("E1"));
        }
        assert_eq!(tracker.confirmed_count(), 1);
    }

    #[test]
    fn test_distinct_ids_independent() {
        let mut tracker = SessionTracker::new();
        assert!(tracker.confirm("E1"));
        assert!(tracker.confirm("E2"));
        assert!(!tracker.confirm("E1"));
        assert_eq!(tracker.confirmed_count(), 2);
    }

    #[test]
    fn test_fresh_tracker_forgets() {
        let mut first = SessionTracker::new();
        assert!(first.confirm("E1"));
        let mut second = SessionTracker::new();
        assert!(second.confirm("E1"));
    }

    #[test]
    fn test_is_confirmed_observes_without_recording() {
        let mut tracker = SessionTracker::new();
        assert!(!tracker.is_confirmed("E1"));
        tracker.confirm("E1");
        assert!(tracker.is_confirmed("E1"));
        assert_eq!(tracker.confirmed_count(), 1);
    }
}
