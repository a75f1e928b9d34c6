//! Append-only log of applied optimizations.

use chrono::{DateTime, NaiveDate, Utc};
use newsalpha_core::stats::round_to;
use newsalpha_core::ConfigKey;
use newsalpha_data::JsonStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::warn;

use crate::analysis::DirectionAnalysis;

/// One key's change within an apply batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedChange {
    pub key: ConfigKey,
    /// `None` when the key was not set before.
    pub old: Option<f64>,
    pub new: f64,
    pub applied: bool,
}

/// The stats that triggered a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub direction: BTreeMap<String, DirectionAnalysis>,
    /// Best threshold from the sweep, if one ran.
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl AnalysisSummary {
    /// Overall weekly accuracy across all directions, one decimal.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> Option<f64> {
        let (correct, total) = self
            .direction
            .values()
            .fold((0, 0), |(c, t), d| (c + d.stats.stats.correct, t + d.stats.stats.total));
        (total > 0).then(|| round_to(correct as f64 / total as f64 * 100.0, 1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationEntry {
    pub timestamp: DateTime<Utc>,
    pub changes: Vec<AppliedChange>,
    pub analysis_summary: AnalysisSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationHistory {
    pub optimizations: Vec<OptimizationEntry>,
    pub accuracy_trend: Vec<TrendPoint>,
}

impl OptimizationHistory {
    /// Accuracy at each of the last `limit` optimizations that had
    /// direction stats.
    #[must_use]
    pub fn trend(&self, limit: usize) -> Vec<TrendPoint> {
        let skip = self.optimizations.len().saturating_sub(limit);
        self.optimizations
            .iter()
            .skip(skip)
            .filter_map(|entry| {
                entry.analysis_summary.accuracy().map(|accuracy| TrendPoint {
                    date: entry.timestamp.date_naive(),
                    accuracy,
                })
            })
            .collect()
    }
}

/// The history document and its file.
///
/// An unreadable file is moved aside to `<name>.corrupt-<timestamp>` before
/// the first append, so its entries are never overwritten.
#[derive(Debug)]
pub struct HistoryStore {
    store: JsonStore,
    history: OptimizationHistory,
    unreadable: bool,
}

impl HistoryStore {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = JsonStore::new(path);
        let (history, unreadable) = match store.load() {
            Ok(history) => (history.unwrap_or_default(), false),
            Err(e) => {
                warn!(
                    path = %store.path().display(),
                    error = %e,
                    "Optimization history is unreadable, it will be backed up before the next write"
                );
                (OptimizationHistory::default(), true)
            }
        };
        Self {
            store,
            history,
            unreadable,
        }
    }

    #[must_use]
    pub fn history(&self) -> &OptimizationHistory {
        &self.history
    }

    /// Appends an entry and rewrites the file. Existing entries are never
    /// modified. A failed write is logged and the entry kept in memory.
    pub fn append(&mut self, entry: OptimizationEntry) {
        if let Some(accuracy) = entry.analysis_summary.accuracy() {
            self.history.accuracy_trend.push(TrendPoint {
                date: entry.timestamp.date_naive(),
                accuracy,
            });
        }
        let stamp = entry.timestamp.format("%Y%m%d%H%M%S").to_string();
        self.history.optimizations.push(entry);

        if self.unreadable {
            match self.back_up_unreadable(&stamp) {
                Ok(backup) => {
                    warn!(backup = %backup.display(), "Moved unreadable optimization history aside");
                    self.unreadable = false;
                }
                Err(e) => {
                    warn!(
                        path = %self.store.path().display(),
                        error = %e,
                        "Could not back up unreadable optimization history, not overwriting it"
                    );
                    return;
                }
            }
        }

        if let Err(e) = self.store.save(&self.history) {
            warn!(
                path = %self.store.path().display(),
                error = %e,
                "Failed to write optimization history"
            );
        }
    }

    fn back_up_unreadable(&self, stamp: &str) -> std::io::Result<PathBuf> {
        let path = self.store.path();
        let mut name = path.file_name().map(OsString::from).unwrap_or_default();
        name.push(format!(".corrupt-{stamp}"));
        let backup = path.with_file_name(name);
        std::fs::rename(path, &backup)?;
        Ok(backup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsalpha_backtest::aggregator::DirectionStats;
    use newsalpha_core::AccuracyStats;
    use tempfile::TempDir;

    fn entry(day: u32, correct: usize, total: usize) -> OptimizationEntry {
        let mut direction = BTreeMap::new();
        direction.insert(
            "up".to_string(),
            DirectionAnalysis {
                stats: DirectionStats {
                    stats: AccuracyStats::from_counts(correct, total),
                    ..DirectionStats::default()
                },
                insufficient_data: false,
            },
        );
        OptimizationEntry {
            timestamp: format!("2025-01-{day:02}T03:00:00Z").parse().unwrap(),
            changes: vec![AppliedChange {
                key: ConfigKey::ThresholdBullish,
                old: Some(1.0),
                new: 1.5,
                applied: true,
            }],
            analysis_summary: AnalysisSummary {
                direction,
                threshold: Some(1.5),
            },
        }
    }

    #[test]
    fn entries_are_appended_and_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("optimization_history.json");

        let mut store = HistoryStore::open(&path);
        store.append(entry(1, 1, 2));
        store.append(entry(2, 3, 4));

        let reloaded = HistoryStore::open(&path);
        assert_eq!(reloaded.history().optimizations.len(), 2);
        assert_eq!(reloaded.history().optimizations[0], entry(1, 1, 2));
        assert_eq!(reloaded.history().accuracy_trend.len(), 2);
    }

    #[test]
    fn unreadable_history_is_backed_up_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("optimization_history.json");
        std::fs::write(&path, "{ \"optimizations\": [ truncated").unwrap();

        let mut store = HistoryStore::open(&path);
        assert!(store.history().optimizations.is_empty());
        store.append(entry(5, 1, 2));

        let backup = dir.path().join("optimization_history.json.corrupt-20250105030000");
        assert_eq!(
            std::fs::read_to_string(backup).unwrap(),
            "{ \"optimizations\": [ truncated"
        );
        assert_eq!(HistoryStore::open(&path).history().optimizations.len(), 1);

        // Later appends go straight to the new file.
        store.append(entry(6, 1, 2));
        assert_eq!(HistoryStore::open(&path).history().optimizations.len(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn trend_covers_last_entries_with_stats() {
        let mut history = OptimizationHistory::default();
        for day in 1..=12 {
            history.optimizations.push(entry(day, 1, 2));
        }
        history.optimizations.push(OptimizationEntry {
            analysis_summary: AnalysisSummary::default(),
            ..entry(13, 0, 0)
        });

        let trend = history.trend(10);
        assert_eq!(trend.len(), 9);
        assert_eq!(trend[0].date, NaiveDate::from_ymd_opt(2025, 1, 4).unwrap());
        assert!((trend[0].accuracy - 50.0).abs() < f64::EPSILON);
    }
}
