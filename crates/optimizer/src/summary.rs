use chrono::{DateTime, Utc};
use newsalpha_core::{PredictionConfig, Thresholds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::history::{OptimizationHistory, TrendPoint};

const TREND_WINDOW: usize = 10;
/// Stock weights below this mark a symbol as difficult.
const DIFFICULT_BELOW: f64 = 0.7;
/// Source weights above this mark a source as reliable.
const RELIABLE_ABOVE: f64 = 1.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConfig {
    pub thresholds: Thresholds,
    pub signal_weights: BTreeMap<String, f64>,
    pub min_confidence: f64,
}

/// Where the optimizer stands: current weights and recent accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub current_config: CurrentConfig,
    pub version: u64,
    pub last_updated: DateTime<Utc>,
    pub total_optimizations: usize,
    pub accuracy_trend: Vec<TrendPoint>,
    pub difficult_stocks: Vec<String>,
    pub reliable_sources: Vec<String>,
}

impl OptimizationSummary {
    #[must_use]
    pub fn build(config: &PredictionConfig, history: &OptimizationHistory) -> Self {
        Self {
            current_config: CurrentConfig {
                thresholds: config.thresholds.clone(),
                signal_weights: config.signal_weights.clone(),
                min_confidence: config.min_confidence,
            },
            version: config.version,
            last_updated: config.last_updated,
            total_optimizations: history.optimizations.len(),
            accuracy_trend: history.trend(TREND_WINDOW),
            difficult_stocks: config
                .stock_adjustments
                .iter()
                .filter(|(_, &w)| w < DIFFICULT_BELOW)
                .map(|(s, _)| s.clone())
                .collect(),
            reliable_sources: config
                .source_reliability
                .iter()
                .filter(|(_, &w)| w > RELIABLE_ABOVE)
                .map(|(s, _)| s.clone())
                .collect(),
        }
    }
}
