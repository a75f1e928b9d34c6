//! Persisted backtest documents.

use chrono::{DateTime, Utc};
use newsalpha_core::{AccuracyStats, VerifiedPrediction};
use newsalpha_data::JsonStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

use crate::aggregator::{AccuracyReport, ThresholdSweep};
use crate::trading::TradingPerformance;

/// What happened to each prediction in one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    /// Artifacts decoded.
    pub artifacts: usize,
    /// Artifacts listed but unreadable or malformed.
    pub skipped_artifacts: usize,
    pub extracted: usize,
    /// Too young to verify.
    pub pending: usize,
    /// Mature but no price outcome available.
    pub unresolved: usize,
    pub verified: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyResults {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub lookback_days: i64,
    pub threshold: f64,
    pub counts: RunCounts,
    /// Most recent verified predictions only.
    pub verified: Vec<VerifiedPrediction>,
    /// Computed over every prediction verified in the run.
    pub stats: AccuracyReport,
    pub threshold_sweep: Option<ThresholdSweep>,
    pub trading: TradingPerformance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub stock_predictions: AccuracyReport,
    pub event_predictions: AccuracyReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyResults {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub lookback_days: i64,
    pub stock_threshold: f64,
    pub event_threshold: f64,
    pub counts: RunCounts,
    pub verified_stocks: Vec<VerifiedPrediction>,
    pub verified_events: Vec<VerifiedPrediction>,
    pub stats: MonthlyStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyResults {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub lookback_days: i64,
    pub threshold: f64,
    pub counts: RunCounts,
    pub verified: Vec<VerifiedPrediction>,
    pub stats: AccuracyReport,
}

/// Latest headline numbers from each backtest kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub generated_at: DateTime<Utc>,
    pub weekly: Option<AccuracyStats>,
    pub monthly_stocks: Option<AccuracyStats>,
    pub monthly_events: Option<AccuracyStats>,
    pub hourly: Option<AccuracyStats>,
    pub trading: Option<TradingPerformance>,
}

impl BacktestSummary {
    #[must_use]
    pub fn from_runs(
        weekly: Option<&WeeklyResults>,
        monthly: Option<&MonthlyResults>,
        hourly: Option<&HourlyResults>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            generated_at,
            weekly: weekly.map(|w| w.stats.overall),
            monthly_stocks: monthly.map(|m| m.stats.stock_predictions.overall),
            monthly_events: monthly.map(|m| m.stats.event_predictions.overall),
            hourly: hourly.map(|h| h.stats.overall),
            trading: weekly.map(|w| w.trading.clone()),
        }
    }
}

/// Keeps the last `keep` items.
#[must_use]
pub fn keep_last<T>(mut items: Vec<T>, keep: usize) -> Vec<T> {
    if items.len() > keep {
        items.drain(..items.len() - keep);
    }
    items
}

/// Reads a results document written by an earlier run.
///
/// Missing files are `None`; unreadable ones are logged and treated as missing.
#[must_use]
pub fn load_results<T: DeserializeOwned>(path: &Path) -> Option<T> {
    match JsonStore::new(path).load() {
        Ok(results) => results,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable backtest results");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn keep_last_drops_oldest() {
        assert_eq!(keep_last(vec![1, 2, 3, 4], 2), vec![3, 4]);
        assert_eq!(keep_last(vec![1, 2], 5), vec![1, 2]);
        assert!(keep_last(Vec::<u8>::new(), 0).is_empty());
    }

    #[test]
    fn missing_or_corrupt_results_are_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weekly_backtest_results.json");
        assert!(load_results::<HourlyResults>(&path).is_none());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_results::<HourlyResults>(&path).is_none());
    }

    #[test]
    fn summary_without_runs_is_empty() {
        let summary = BacktestSummary::from_runs(None, None, None, Utc::now());
        assert!(summary.weekly.is_none());
        assert!(summary.trading.is_none());

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["monthly_events"].is_null());
    }
}
