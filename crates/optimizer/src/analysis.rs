//! Turns verified predictions into config recommendations.
//!
//! The cutoffs below are policy. Directions and symbols are adjusted eagerly
//! once they have enough samples; sources only move when the suggested
//! weight differs from the stored one by more than [`SOURCE_HYSTERESIS`].

use chrono::{DateTime, Utc};
use newsalpha_backtest::aggregator::{direction_stats, group_by, threshold_sweep, DirectionStats};
use newsalpha_backtest::{ThresholdSweep, SWEEP_CANDIDATES};
use newsalpha_core::{ConfigKey, Direction, PredictionConfig, VerifiedPrediction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_DIRECTION_SAMPLES: usize = 10;
pub const MIN_SOURCE_REPORTED: usize = 5;
pub const MIN_SOURCE_ADJUSTED: usize = 10;
pub const MIN_STOCK_SAMPLES: usize = 3;

/// Accuracy (percent) below which a direction or symbol is discounted.
pub const POOR_ACCURACY: f64 = 30.0;
/// Accuracy (percent) above which a direction or symbol is boosted.
pub const GOOD_ACCURACY: f64 = 60.0;
pub const DISCOUNT_WEIGHT: f64 = 0.5;
pub const BOOST_WEIGHT: f64 = 1.3;
pub const SOURCE_HYSTERESIS: f64 = 0.2;

/// How many symbols a recommendation line names.
const LISTED_SYMBOLS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionAnalysis {
    #[serde(flatten)]
    pub stats: DirectionStats,
    /// Fewer than [`MIN_DIRECTION_SAMPLES`]; never drives a recommendation.
    pub insufficient_data: bool,
}

/// Accuracy of one source or symbol with the weight it suggests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightAnalysis {
    pub total: usize,
    pub correct: usize,
    /// Percent, one decimal.
    pub accuracy: f64,
    pub suggested_weight: f64,
}

/// One recommended config change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub key: ConfigKey,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub timestamp: DateTime<Utc>,
    pub direction_analysis: BTreeMap<String, DirectionAnalysis>,
    pub stock_analysis: BTreeMap<String, WeightAnalysis>,
    pub source_analysis: BTreeMap<String, WeightAnalysis>,
    /// `None` when there were no weekly verified predictions.
    pub threshold_analysis: Option<ThresholdSweep>,
    pub recommendations: Vec<String>,
    /// In rule order: directions, thresholds, sources, symbols.
    pub adjustments: Vec<Adjustment>,
}

impl Analysis {
    #[must_use]
    pub fn has_adjustments(&self) -> bool {
        !self.adjustments.is_empty()
    }
}

/// Analyzes weekly verified predictions and monthly verified stock picks
/// against the current config.
#[must_use]
pub fn analyze(
    weekly: &[VerifiedPrediction],
    monthly_stocks: &[VerifiedPrediction],
    config: &PredictionConfig,
    timestamp: DateTime<Utc>,
) -> Analysis {
    let combined: Vec<VerifiedPrediction> = weekly.iter().chain(monthly_stocks).cloned().collect();

    let mut analysis = Analysis {
        timestamp,
        direction_analysis: analyze_directions(weekly),
        stock_analysis: analyze_stocks(&combined),
        source_analysis: analyze_sources(&combined),
        threshold_analysis: threshold_sweep(weekly, &SWEEP_CANDIDATES, config.threshold()),
        recommendations: Vec::new(),
        adjustments: Vec::new(),
    };
    recommend(&mut analysis, config);
    analysis
}

fn analyze_directions(weekly: &[VerifiedPrediction]) -> BTreeMap<String, DirectionAnalysis> {
    direction_stats(weekly)
        .into_iter()
        .map(|(direction, stats)| {
            let insufficient_data = !stats.stats.has_samples(MIN_DIRECTION_SAMPLES);
            let analysis = DirectionAnalysis {
                stats,
                insufficient_data,
            };
            (direction, analysis)
        })
        .collect()
}

fn analyze_stocks(verified: &[VerifiedPrediction]) -> BTreeMap<String, WeightAnalysis> {
    group_by(verified, |v| v.symbol().map(str::to_string))
        .into_iter()
        .filter(|(_, stats)| stats.has_samples(MIN_STOCK_SAMPLES))
        .map(|(symbol, stats)| {
            let analysis = WeightAnalysis {
                total: stats.total,
                correct: stats.correct,
                accuracy: stats.accuracy_rounded(),
                suggested_weight: (stats.accuracy / 50.0).clamp(0.5, 1.5),
            };
            (symbol, analysis)
        })
        .collect()
}

fn analyze_sources(verified: &[VerifiedPrediction]) -> BTreeMap<String, WeightAnalysis> {
    group_by(verified, |v| Some(v.prediction.source.as_str().to_string()))
        .into_iter()
        .filter(|(_, stats)| stats.has_samples(MIN_SOURCE_REPORTED))
        .map(|(source, stats)| {
            let analysis = WeightAnalysis {
                total: stats.total,
                correct: stats.correct,
                accuracy: stats.accuracy_rounded(),
                // Unrounded accuracy, so the hysteresis check sees the true weight.
                suggested_weight: (stats.accuracy / 50.0).clamp(0.3, 1.5),
            };
            (source, analysis)
        })
        .collect()
}

fn recommend(analysis: &mut Analysis, config: &PredictionConfig) {
    let mut recommendations = Vec::new();
    let mut adjustments = Vec::new();

    for (name, data) in &analysis.direction_analysis {
        if data.insufficient_data {
            continue;
        }
        let Ok(direction) = name.parse::<Direction>() else {
            continue;
        };
        let accuracy = data.stats.stats.accuracy_rounded();
        if accuracy < POOR_ACCURACY {
            recommendations.push(format!(
                "{name} predictions are only {accuracy}% accurate; lowering their weight to {DISCOUNT_WEIGHT} (consider fading them)"
            ));
            adjustments.push(Adjustment {
                key: ConfigKey::SignalWeight(direction),
                value: DISCOUNT_WEIGHT,
            });
        } else if accuracy > GOOD_ACCURACY {
            recommendations.push(format!(
                "{name} predictions are {accuracy}% accurate; raising their weight to {BOOST_WEIGHT}"
            ));
            adjustments.push(Adjustment {
                key: ConfigKey::SignalWeight(direction),
                value: BOOST_WEIGHT,
            });
        }
    }

    if let Some(sweep) = &analysis.threshold_analysis {
        if (sweep.best_threshold - sweep.current_threshold).abs() > f64::EPSILON {
            recommendations.push(format!(
                "Move the threshold from {}% to {}% to lift accuracy to {}%",
                sweep.current_threshold, sweep.best_threshold, sweep.best_accuracy
            ));
            adjustments.push(Adjustment {
                key: ConfigKey::ThresholdBullish,
                value: sweep.best_threshold,
            });
            adjustments.push(Adjustment {
                key: ConfigKey::ThresholdBearish,
                value: -sweep.best_threshold,
            });
        }
    }

    for (source, data) in &analysis.source_analysis {
        if data.total < MIN_SOURCE_ADJUSTED {
            continue;
        }
        let suggested = data.suggested_weight;
        let current = config.source_reliability.get(source).copied().unwrap_or(1.0);
        if (suggested - current).abs() > SOURCE_HYSTERESIS {
            recommendations.push(format!("Adjust reliability of source '{source}' to {suggested:.2}"));
            adjustments.push(Adjustment {
                key: ConfigKey::SourceReliability(source.clone()),
                value: suggested,
            });
        }
    }

    let mut difficult = Vec::new();
    let mut easy = Vec::new();
    for (symbol, data) in &analysis.stock_analysis {
        if data.accuracy < POOR_ACCURACY {
            difficult.push(symbol.as_str());
            adjustments.push(Adjustment {
                key: ConfigKey::StockAdjustment(symbol.clone()),
                value: DISCOUNT_WEIGHT,
            });
        } else if data.accuracy > GOOD_ACCURACY {
            easy.push(symbol.as_str());
            adjustments.push(Adjustment {
                key: ConfigKey::StockAdjustment(symbol.clone()),
                value: BOOST_WEIGHT,
            });
        }
    }
    if !difficult.is_empty() {
        recommendations.push(format!(
            "Hard to predict: {}; weight lowered",
            difficult.iter().take(LISTED_SYMBOLS).copied().collect::<Vec<_>>().join(", ")
        ));
    }
    if !easy.is_empty() {
        recommendations.push(format!(
            "Easy to predict: {}; weight raised",
            easy.iter().take(LISTED_SYMBOLS).copied().collect::<Vec<_>>().join(", ")
        ));
    }

    analysis.recommendations = recommendations;
    analysis.adjustments = adjustments;
}
