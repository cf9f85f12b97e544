use std::path::PathBuf;

/// Station configuration, loaded from environment variables.
pub struct Config {
    /// Directory of enrolled identity files.
    pub gallery_dir: PathBuf,
    /// Directory of attendance CSV files.
    pub attendance_dir: PathBuf,
    /// Euclidean distance at or below which a face is accepted.
    pub match_threshold: f32,
    /// Signature samples collected per enrollment.
    pub samples_per_enroll: usize,
    /// How long the post-mark notification stays visible, in seconds.
    pub notify_duration_secs: u64,
}

impl Config {
    /// Load configuration from `ROLLCALL_*` environment variables with
    /// defaults. Data lands under `$XDG_DATA_HOME/rollcall` (or
    /// `~/.local/share/rollcall`).
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("rollcall");

        let gallery_dir = std::env::var("ROLLCALL_GALLERY_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("students"));

        let attendance_dir = std::env::var("ROLLCALL_ATTENDANCE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("attendance"));

        Self {
            gallery_dir,
            attendance_dir,
            match_threshold: env_f32(
                "ROLLCALL_MATCH_THRESHOLD",
                rollcall_core::DEFAULT_MATCH_THRESHOLD,
            ),
            samples_per_enroll: env_usize("ROLLCALL_SAMPLES_PER_ENROLL", 5),
            notify_duration_secs: env_u64("ROLLCALL_NOTIFY_DURATION_SECS", 5),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
