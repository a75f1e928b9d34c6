//! Accuracy statistics over verified predictions.
//!
//! Everything here is a pure function of its input slice. Empty input
//! yields zeroed stats for every grouping.

use newsalpha_core::stats::{mean, round_to, sample_std};
use newsalpha_core::{AccuracyStats, VerifiedPrediction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::verifier::{classify, is_correct};

/// Candidate thresholds re-tried by [`threshold_sweep`].
pub const SWEEP_CANDIDATES: [f64; 6] = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0];

/// Per-symbol stats are only reported with at least this many samples.
pub const MIN_SYMBOL_SAMPLES: usize = 3;

/// Predictions with confidence above this are bucketed as high confidence.
pub const HIGH_CONFIDENCE: f64 = 0.5;

/// Threshold assumed best when no candidate beats zero accuracy.
pub const DEFAULT_BEST_THRESHOLD: f64 = 1.0;

#[must_use]
pub fn aggregate(verified: &[VerifiedPrediction]) -> AccuracyStats {
    let correct = verified.iter().filter(|v| v.is_correct).count();
    AccuracyStats::from_counts(correct, verified.len())
}

/// Groups by `key_fn` and computes stats per key. `None` keys are dropped.
pub fn group_by<K, F>(verified: &[VerifiedPrediction], key_fn: F) -> BTreeMap<K, AccuracyStats>
where
    K: Ord,
    F: Fn(&VerifiedPrediction) -> Option<K>,
{
    let mut counts: BTreeMap<K, (usize, usize)> = BTreeMap::new();
    for v in verified {
        if let Some(key) = key_fn(v) {
            let entry = counts.entry(key).or_default();
            entry.1 += 1;
            if v.is_correct {
                entry.0 += 1;
            }
        }
    }
    counts
        .into_iter()
        .map(|(k, (correct, total))| (k, AccuracyStats::from_counts(correct, total)))
        .collect()
}

/// Stats for one predicted direction plus the spread of realized moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionStats {
    #[serde(flatten)]
    pub stats: AccuracyStats,
    /// Mean realized change in percent, two decimals.
    pub mean_change: f64,
    /// Sample standard deviation of realized change, two decimals.
    pub std_change: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBuckets {
    pub high: AccuracyStats,
    pub low: AccuracyStats,
}

/// Every grouping the system reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    #[serde(flatten)]
    pub overall: AccuracyStats,
    #[serde(default)]
    pub by_direction: BTreeMap<String, DirectionStats>,
    /// Keyed by region: `cn`, `hk`, `us`, `unknown`.
    #[serde(default)]
    pub by_market: BTreeMap<String, AccuracyStats>,
    #[serde(default)]
    pub by_source: BTreeMap<String, AccuracyStats>,
    /// Only symbols with at least [`MIN_SYMBOL_SAMPLES`] verified predictions.
    #[serde(default)]
    pub by_symbol: BTreeMap<String, AccuracyStats>,
    #[serde(default)]
    pub by_confidence: ConfidenceBuckets,
}

impl AccuracyReport {
    #[must_use]
    pub fn build(verified: &[VerifiedPrediction]) -> Self {
        let by_direction = direction_stats(verified);
        let by_market = group_by(verified, |v| Some(v.market().region().to_string()));
        let by_source = group_by(verified, |v| Some(v.prediction.source.as_str().to_string()));
        let mut by_symbol = group_by(verified, |v| v.symbol().map(str::to_string));
        by_symbol.retain(|_, stats| stats.has_samples(MIN_SYMBOL_SAMPLES));

        let (high, low): (Vec<_>, Vec<_>) = verified
            .iter()
            .cloned()
            .partition(|v| v.prediction.confidence > HIGH_CONFIDENCE);

        Self {
            overall: aggregate(verified),
            by_direction,
            by_market,
            by_source,
            by_symbol,
            by_confidence: ConfidenceBuckets {
                high: aggregate(&high),
                low: aggregate(&low),
            },
        }
    }
}

/// Per predicted direction, keyed by the direction's name.
#[must_use]
pub fn direction_stats(verified: &[VerifiedPrediction]) -> BTreeMap<String, DirectionStats> {
    let mut groups: BTreeMap<String, Vec<&VerifiedPrediction>> = BTreeMap::new();
    for v in verified {
        groups
            .entry(v.prediction.predicted_direction.as_str().to_string())
            .or_default()
            .push(v);
    }

    groups
        .into_iter()
        .map(|(direction, group)| {
            let changes: Vec<f64> = group.iter().map(|v| v.actual_change_pct).collect();
            let correct = group.iter().filter(|v| v.is_correct).count();
            let stats = DirectionStats {
                stats: AccuracyStats::from_counts(correct, group.len()),
                mean_change: round_to(mean(&changes), 2),
                std_change: round_to(sample_std(&changes), 2),
            };
            (direction, stats)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub threshold: f64,
    #[serde(flatten)]
    pub stats: AccuracyStats,
}

/// Accuracy of the same verified set re-judged under each candidate threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSweep {
    pub current_threshold: f64,
    pub best_threshold: f64,
    /// Accuracy at `best_threshold`, one decimal.
    pub best_accuracy: f64,
    pub results: Vec<ThresholdResult>,
}

/// Re-judges `verified` under each candidate threshold.
///
/// The best threshold is the first candidate with strictly the highest
/// accuracy, or [`DEFAULT_BEST_THRESHOLD`] when none beats zero. Returns
/// `None` for an empty set, which carries no evidence about any threshold.
#[must_use]
pub fn threshold_sweep(
    verified: &[VerifiedPrediction],
    candidates: &[f64],
    current_threshold: f64,
) -> Option<ThresholdSweep> {
    if verified.is_empty() {
        return None;
    }

    let mut best_threshold = DEFAULT_BEST_THRESHOLD;
    let mut best_accuracy = 0.0;
    let results = candidates
        .iter()
        .map(|&threshold| {
            let correct = verified
                .iter()
                .filter(|v| {
                    let actual = classify(v.actual_change_pct, threshold);
                    is_correct(
                        v.prediction.predicted_direction,
                        actual,
                        v.actual_change_pct,
                        threshold,
                    )
                })
                .count();
            let stats = AccuracyStats::from_counts(correct, verified.len());
            if stats.accuracy > best_accuracy {
                best_accuracy = stats.accuracy;
                best_threshold = threshold;
            }
            ThresholdResult { threshold, stats }
        })
        .collect();

    Some(ThresholdSweep {
        current_threshold,
        best_threshold,
        best_accuracy: round_to(best_accuracy, 1),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::Verifier;
    use chrono::{NaiveDate, Utc};
    use newsalpha_core::{Direction, PredictionRecord, Source, Target};

    fn verified(symbol: &str, direction: Direction, change: f64, confidence: f64) -> VerifiedPrediction {
        let record = PredictionRecord::new(
            Target::symbol(symbol),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            direction,
            Source::WeeklyAnalysis,
        )
        .with_confidence(confidence);
        Verifier::new(1.0).judge(&record, change, symbol, Utc::now())
    }

    fn sample() -> Vec<VerifiedPrediction> {
        vec![
            verified("600519", Direction::Up, 3.0, 0.8),
            verified("600519", Direction::Up, -2.0, 0.8),
            verified("600519", Direction::Down, -1.5, 0.4),
            verified("AAPL", Direction::Flat, 0.5, 0.5),
            verified("AAPL", Direction::Up, 2.0, 0.9),
        ]
    }

    // ============================================================
    // aggregate / group_by
    // ============================================================

    #[test]
    fn empty_input_yields_zeroed_stats_everywhere() {
        let report = AccuracyReport::build(&[]);
        assert_eq!(report.overall.total, 0);
        assert_eq!(report.overall.accuracy, 0.0);
        assert!(!report.overall.accuracy.is_nan());
        assert!(report.by_direction.is_empty());
        assert_eq!(report.by_confidence.high.accuracy, 0.0);
        assert_eq!(report.by_confidence.low.total, 0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let data = sample();
        assert_eq!(AccuracyReport::build(&data), AccuracyReport::build(&data));
        assert_eq!(aggregate(&data), aggregate(&data));
    }

    #[test]
    fn overall_and_market_groupings() {
        let report = AccuracyReport::build(&sample());

        assert_eq!(report.overall.total, 5);
        assert_eq!(report.overall.correct, 4);
        assert!((report.overall.accuracy - 80.0).abs() < 1e-9);

        assert_eq!(report.by_market["cn"].total, 3);
        assert_eq!(report.by_market["us"].correct, 2);
        assert_eq!(report.by_source["weekly_analysis"].total, 5);
    }

    #[test]
    fn per_symbol_requires_three_samples() {
        let report = AccuracyReport::build(&sample());
        assert!(report.by_symbol.contains_key("600519"));
        assert!(!report.by_symbol.contains_key("AAPL"));
    }

    #[test]
    fn confidence_buckets_split_at_one_half() {
        let report = AccuracyReport::build(&sample());
        assert_eq!(report.by_confidence.high.total, 3);
        assert_eq!(report.by_confidence.low.total, 2);
    }

    #[test]
    fn direction_stats_carry_change_spread() {
        let report = AccuracyReport::build(&sample());
        let up = &report.by_direction["up"];
        assert_eq!(up.stats.total, 3);
        assert_eq!(up.stats.correct, 2);
        assert!((up.mean_change - 1.0).abs() < 1e-9);
        assert!(up.std_change > 0.0);
    }

    #[test]
    fn report_serializes_overall_at_top_level() {
        let json = serde_json::to_value(AccuracyReport::build(&sample())).unwrap();
        assert_eq!(json["total"], 5);
        assert_eq!(json["by_direction"]["up"]["total"], 3);

        let back: AccuracyReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.overall.correct, 4);
    }

    // ============================================================
    // Threshold sweep
    // ============================================================

    #[test]
    fn sweep_of_empty_set_is_none() {
        assert!(threshold_sweep(&[], &SWEEP_CANDIDATES, 1.0).is_none());
    }

    #[test]
    fn sweep_picks_first_strictly_best_threshold() {
        // Flat calls on moves of 1.2%: wrong at 0.5 (2 * 0.5 = 1.0 band),
        // right from 1.0 upward. 1.0 is the first to reach the maximum.
        let data = vec![
            verified("AAA", Direction::Flat, 1.2, 0.5),
            verified("BBB", Direction::Flat, -1.2, 0.5),
        ];
        let sweep = threshold_sweep(&data, &SWEEP_CANDIDATES, 2.0).unwrap();

        assert_eq!(sweep.results.len(), 6);
        assert_eq!(sweep.results[0].stats.correct, 0);
        assert!((sweep.best_threshold - 1.0).abs() < f64::EPSILON);
        assert!((sweep.best_accuracy - 100.0).abs() < f64::EPSILON);
        assert!((sweep.current_threshold - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sweep_defaults_when_nothing_is_correct() {
        let data = vec![verified("AAA", Direction::Up, -10.0, 0.5)];
        let sweep = threshold_sweep(&data, &SWEEP_CANDIDATES, 2.0).unwrap();
        assert!((sweep.best_threshold - DEFAULT_BEST_THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(sweep.best_accuracy, 0.0);
    }
}
