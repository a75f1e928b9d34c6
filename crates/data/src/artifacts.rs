//! Discovery of historical report artifacts on disk.
//!
//! Reports are written by upstream producers as
//! `{prefix}{YYYYMMDD}_{HHMMSS}.{ext}`. The timestamp in the name is the
//! report's generation time; files without one fall back to their mtime.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use newsalpha_core::StorageConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One report file and the time it was generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub timestamp: NaiveDateTime,
}

impl ArtifactFile {
    /// Anchor date for every prediction extracted from this artifact.
    #[must_use]
    pub fn anchor_date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read as UTF-8 text.
    pub fn read_to_string(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// A directory of artifacts sharing a name prefix and extension.
#[derive(Debug, Clone)]
pub struct ArtifactDirectory {
    dir: PathBuf,
    prefix: String,
    extension: String,
}

impl ArtifactDirectory {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    /// `data/weekly/analysis_*.json`
    #[must_use]
    pub fn weekly(storage: &StorageConfig) -> Self {
        Self::new(storage.weekly_dir(), "analysis_", "json")
    }

    /// `data/monthly/analysis_*.json`
    #[must_use]
    pub fn monthly(storage: &StorageConfig) -> Self {
        Self::new(storage.monthly_dir(), "analysis_", "json")
    }

    /// `data/reports/report_*.txt`
    #[must_use]
    pub fn hourly(storage: &StorageConfig) -> Self {
        Self::new(storage.reports_dir(), "report_", "txt")
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists artifacts generated at or after `since`, oldest first.
    ///
    /// A missing directory yields an empty list. Entries whose metadata cannot
    /// be read are skipped with a warning.
    #[must_use]
    pub fn list_since(&self, since: NaiveDateTime) -> Vec<ArtifactFile> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(dir = %self.dir.display(), "Artifact directory does not exist");
                return Vec::new();
            }
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Failed to read artifact directory");
                return Vec::new();
            }
        };

        let mut artifacts: Vec<ArtifactFile> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| self.matches(path))
            .filter_map(|path| match artifact_timestamp(&path) {
                Ok(timestamp) => Some(ArtifactFile { path, timestamp }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping artifact without timestamp");
                    None
                }
            })
            .filter(|artifact| artifact.timestamp >= since)
            .collect();

        artifacts.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.path.cmp(&b.path)));

        debug!(
            dir = %self.dir.display(),
            count = artifacts.len(),
            since = %since,
            "Listed artifacts"
        );
        artifacts
    }

    fn matches(&self, path: &Path) -> bool {
        let name_ok = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&self.prefix));
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension));
        name_ok && ext_ok && path.is_file()
    }
}

/// Generation time of an artifact: from its name if present, else its mtime.
///
/// # Errors
///
/// Returns an error if the name carries no timestamp and metadata is unreadable.
pub fn artifact_timestamp(path: &Path) -> io::Result<NaiveDateTime> {
    if let Some(ts) = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(timestamp_from_name)
    {
        return Ok(ts);
    }
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}

/// Parses the `YYYYMMDD[_HHMMSS|_HHMM]` segment of a file stem.
#[must_use]
pub fn timestamp_from_name(stem: &str) -> Option<NaiveDateTime> {
    let parts: Vec<&str> = stem.split('_').collect();
    let is_digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());

    parts.iter().enumerate().find_map(|(i, part)| {
        if !is_digits(part, 8) {
            return None;
        }
        let date = NaiveDate::parse_from_str(part, "%Y%m%d").ok()?;
        let time = match parts.get(i + 1) {
            Some(t) if is_digits(t, 6) => NaiveTime::parse_from_str(t, "%H%M%S").ok(),
            Some(t) if is_digits(t, 4) => NaiveTime::parse_from_str(t, "%H%M").ok(),
            _ => None,
        }
        .or_else(|| NaiveTime::from_hms_opt(0, 0, 0))?;
        Some(date.and_time(time))
    })
}
