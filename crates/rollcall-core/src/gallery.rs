//! Durable gallery store — one bincode-serialized identity file per
//! enrolled person.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::IdentityRecord;

/// Extension for identity files in the gallery directory.
pub const GALLERY_FILE_EXT: &str = "bin";

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("failed to create gallery directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to scan gallery directory {path}: {source}")]
    ScanDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read identity file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt identity file {path}: {source}")]
    CorruptEntry {
        path: PathBuf,
        source: bincode::Error,
    },
    #[error("failed to write identity file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode identity record for {enrollment_id}: {source}")]
    Encode {
        enrollment_id: String,
        source: bincode::Error,
    },
    #[error("identity record for {0} has no signatures")]
    NoSignatures(String),
}

/// Directory-backed store of enrolled identities.
///
/// Load order follows directory iteration and is not stable across
/// runs; callers must not depend on it.
pub struct GalleryStore {
    dir: PathBuf,
}

impl GalleryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a record: `<enrollment_id>_<name>.bin`, spaces in
    /// the name replaced with underscores.
    pub fn file_name(record: &IdentityRecord) -> String {
        format!(
            "{}_{}.{}",
            record.enrollment_id,
            record.name.replace(' ', "_"),
            GALLERY_FILE_EXT
        )
    }

    fn ensure_dir(&self) -> Result<(), GalleryError> {
        fs::create_dir_all(&self.dir).map_err(|source| GalleryError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    /// Load every enrolled identity, failing on the first unreadable or
    /// corrupt file. A missing directory is created and yields an empty
    /// gallery (first run is not an error).
    pub fn load(&self) -> Result<Vec<IdentityRecord>, GalleryError> {
        let mut records = Vec::new();
        for path in self.identity_files()? {
            records.push(Self::read_record(&path)?);
        }
        Ok(records)
    }

    /// Load every readable identity, skipping corrupt or unreadable
    /// files with a warning. Returns the records plus the skip count.
    ///
    /// The recognition loop uses this variant so one bad enrollment
    /// file cannot take down a whole session.
    pub fn load_lossy(&self) -> Result<(Vec<IdentityRecord>, usize), GalleryError> {
        let mut records = Vec::new();
        let mut skipped = 0usize;
        for path in self.identity_files()? {
            match Self::read_record(&path) {
                Ok(record) => records.push(record),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable gallery entry");
                }
            }
        }
        Ok((records, skipped))
    }

    /// Persist one identity record, overwriting any previous file with
    /// the same enrollment id and name. Records must carry at least one
    /// signature sample.
    pub fn save(&self, record: &IdentityRecord) -> Result<PathBuf, GalleryError> {
        if record.signatures.is_empty() {
            return Err(GalleryError::NoSignatures(record.enrollment_id.clone()));
        }
        self.ensure_dir()?;

        let encoded = bincode::serialize(record).map_err(|source| GalleryError::Encode {
            enrollment_id: record.enrollment_id.clone(),
            source,
        })?;

        let path = self.dir.join(Self::file_name(record));
        fs::write(&path, encoded).map_err(|source| GalleryError::WriteFile {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            enrollment = %record.enrollment_id,
            samples = record.signatures.len(),
            path = %path.display(),
            "identity record saved"
        );
        Ok(path)
    }

    fn identity_files(&self) -> Result<Vec<PathBuf>, GalleryError> {
        if !self.dir.exists() {
            self.ensure_dir()?;
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|source| GalleryError::ScanDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| GalleryError::ScanDir {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(GALLERY_FILE_EXT) {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn read_record(path: &Path) -> Result<IdentityRecord, GalleryError> {
        let bytes = fs::read(path).map_err(|source| GalleryError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        bincode::deserialize(&bytes).map_err(|source| GalleryError::CorruptEntry {
            path: path.to_path_buf(),
            source,
        })
    }
}
