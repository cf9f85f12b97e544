//! Durable attendance ledger — one CSV table per subject per calendar
//! day, at most one row per enrollment id per table.
//!
//! Concurrency contract: one writer process per subject/day file. The
//! check-then-append sequence is not locked; what the ledger does
//! guarantee is that each persist is a whole-table write to a sibling
//! temp file followed by an atomic rename, so readers never observe a
//! torn or half-written table.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::IdentityMeta;

/// Column order of every attendance file, fixed since the first
/// deployment; external tooling parses these headers.
pub const ATTENDANCE_COLUMNS: [&str; 5] = ["Enrollment", "Name", "Class", "Subject", "Time Stamp"];

/// Timestamp column format: 12-hour clock, e.g. `02:35:10 PM`.
const TIMESTAMP_FORMAT: &str = "%I:%M:%S %p";

/// One row of an attendance file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRow {
    #[serde(rename = "Enrollment")]
    pub enrollment: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Class")]
    pub class: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Time Stamp")]
    pub time_stamp: String,
}

/// Outcome of a mark attempt. `AlreadyMarked` is informational, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked,
    AlreadyMarked,
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("failed to create attendance directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode attendance table for {path}: {source}")]
    Encode { path: PathBuf, source: csv::Error },
    #[error("failed to persist attendance file {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Directory-backed attendance ledger, partitioned by subject and
/// calendar date.
pub struct AttendanceLedger {
    dir: PathBuf,
}

impl AttendanceLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic file for a `(subject, date)` pair:
    /// `attendance_<subject>_<YYYY-MM-DD>.csv`.
    pub fn file_path(&self, subject: &str, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("attendance_{}_{}.csv", subject, date.format("%Y-%m-%d")))
    }

    /// Record attendance for one identity under `subject` at `when`.
    ///
    /// Idempotent per subject/day: if the enrollment id already has a
    /// row in that day's table, nothing is written and
    /// [`MarkOutcome::AlreadyMarked`] is returned. An unreadable
    /// existing file is treated as empty (logged), so a corrupt prior
    /// table never blocks marking; it is replaced wholesale on the next
    /// successful write.
    pub fn mark(
        &self,
        identity: &IdentityMeta,
        subject: &str,
        when: DateTime<Local>,
    ) -> Result<MarkOutcome, LedgerError> {
        fs::create_dir_all(&self.dir).map_err(|source| LedgerError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.file_path(subject, when.date_naive());
        let mut rows = Self::read_rows_lossy(&path);

        if rows.iter().any(|r| r.enrollment == identity.enrollment_id) {
            tracing::info!(
                enrollment = %identity.enrollment_id,
                name = %identity.name,
                subject,
                "attendance already marked today"
            );
            return Ok(MarkOutcome::AlreadyMarked);
        }

        let time_stamp = when.format(TIMESTAMP_FORMAT).to_string();
        rows.push(AttendanceRow {
            enrollment: identity.enrollment_id.clone(),
            name: identity.name.clone(),
            class: identity.class_label.clone(),
            subject: subject.to_string(),
            time_stamp: time_stamp.clone(),
        });
        self.write_rows(&path, &rows)?;

        tracing::info!(
            enrollment = %identity.enrollment_id,
            name = %identity.name,
            subject,
            time = %time_stamp,
            "attendance marked"
        );
        Ok(MarkOutcome::Marked)
    }

    /// Read the rows of one subject/day table. Missing or unreadable
    /// files read as empty.
    pub fn rows(&self, subject: &str, date: NaiveDate) -> Vec<AttendanceRow> {
        Self::read_rows_lossy(&self.file_path(subject, date))
    }

    fn read_rows_lossy(path: &Path) -> Vec<AttendanceRow> {
        if !path.exists() {
            return Vec::new();
        }
        let mut reader = match csv::Reader::from_path(path) {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unreadable attendance file; starting fresh table");
                return Vec::new();
            }
        };
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            match row {
                Ok(row) => rows.push(row),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "corrupt attendance file; starting fresh table");
                    return Vec::new();
                }
            }
        }
        rows
    }

    /// Serialize the whole table next to the target, then rename over
    /// it. Rename within one directory is atomic on POSIX filesystems.
    fn write_rows(&self, path: &Path, rows: &[AttendanceRow]) -> Result<(), LedgerError> {
        let tmp_path = path.with_extension("csv.tmp");

        let mut writer =
            csv::Writer::from_path(&tmp_path).map_err(|source| LedgerError::Encode {
                path: tmp_path.clone(),
                source,
            })?;
        for row in rows {
            writer.serialize(row).map_err(|source| LedgerError::Encode {
                path: tmp_path.clone(),
                source,
            })?;
        }
        writer.flush().map_err(|source| LedgerError::Persist {
            path: tmp_path.clone(),
            source,
        })?;
        drop(writer);

        fs::rename(&tmp_path, path).map_err(|source| LedgerError::Persist {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alice() -> IdentityMeta {
        IdentityMeta {
            name: "Alice Woods".to_string(),
            enrollment_id: "E1".to_string(),
            class_label: "CS-2".to_string(),
        }
    }

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(year, month, day, hour, 30, 0).unwrap()
    }

    #[test]
    fn test_mark_then_already_marked() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = AttendanceLedger::new(tmp.path());
        let when = at(2026, 3, 9, 14);

        assert_eq!(ledger.mark(&alice(), "Physics", when).unwrap(), MarkOutcome::Marked);
        assert_eq!(
            ledger.mark(&alice(), "Physics", when).unwrap(),
            MarkOutcome::AlreadyMarked
        );

        let rows = ledger.rows("Physics", when.date_naive());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].enrollment, "E1");
        assert_eq!(rows[0].subject, "Physics");
    }

    #[test]
    fn test_partitioned_by_subject_and_day() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = AttendanceLedger::new(tmp.path());
        let monday = at(2026, 3, 9, 9);
        let tuesday = at(2026, 3, 10, 9);

        ledger.mark(&alice(), "Physics", monday).unwrap();
        assert_eq!(ledger.mark(&alice(), "Chemistry", monday).unwrap(), MarkOutcome::Marked);
        assert_eq!(ledger.mark(&alice(), "Physics", tuesday).unwrap(), MarkOutcome::Marked);

        assert_eq!(ledger.rows("Physics", monday.date_naive()).len(), 1);
        assert_eq!(ledger.rows("Chemistry", monday.date_naive()).len(), 1);
        assert_eq!(ledger.rows("Physics", tuesday.date_naive()).len(), 1);
    }

    #[test]
    fn test_distinct_identities_append() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = AttendanceLedger::new(tmp.path());
        let when = at(2026, 3, 9, 9);
        let bob = IdentityMeta {
            name: "Bob".to_string(),
            enrollment_id: "E2".to_string(),
            class_label: "N/A".to_string(),
        };

        ledger.mark(&alice(), "Physics", when).unwrap();
        ledger.mark(&bob, "Physics", when).unwrap();

        let rows = ledger.rows("Physics", when.date_naive());
        assert_eq!(rows.len(), 2);
        // Existing rows are never rewritten; order of arrival holds.
        assert_eq!(rows[0].enrollment, "E1");
        assert_eq!(rows[1].enrollment, "E2");
    }

    #[test]
    fn test_header_schema_exact() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = AttendanceLedger::new(tmp.path());
        let when = at(2026, 3, 9, 14);
        ledger.mark(&alice(), "Physics", when).unwrap();

        let contents = fs::read_to_string(ledger.file_path("Physics", when.date_naive())).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header, ATTENDANCE_COLUMNS.join(","));
    }

    #[test]
    fn test_timestamp_is_twelve_hour_clock() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = AttendanceLedger::new(tmp.path());
        let when = at(2026, 3, 9, 14);
        ledger.mark(&alice(), "Physics", when).unwrap();

        let rows = ledger.rows("Physics", when.date_naive());
        assert_eq!(rows[0].time_stamp, "02:30:00 PM");
    }

    #[test]
    fn test_file_name_convention() {
        let ledger = AttendanceLedger::new("/var/lib/rollcall");
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let path = ledger.file_path("Physics", date);
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("attendance_Physics_2026-03-09.csv")
        );
    }

    #[test]
    fn test_corrupt_file_recovers_to_fresh_table() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = AttendanceLedger::new(tmp.path());
        let when = at(2026, 3, 9, 9);

        // Wrong header and row shape: deserialization fails per row.
        let path = ledger.file_path("Physics", when.date_naive());
        fs::write(&path, b"A,B\n1,2\n").unwrap();

        assert_eq!(ledger.mark(&alice(), "Physics", when).unwrap(), MarkOutcome::Marked);
        let rows = ledger.rows("Physics", when.date_naive());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].enrollment, "E1");
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = AttendanceLedger::new(tmp.path());
        ledger.mark(&alice(), "Physics", at(2026, 3, 9, 9)).unwrap();

        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
