//! The optimizer facade: analysis, versioned apply, history and reports.

use chrono::{DateTime, Utc};
use newsalpha_backtest::{load_results, MonthlyResults, WeeklyResults};
use newsalpha_core::{PredictionConfig, PredictionRecord, StorageConfig, VerifiedPrediction};
use newsalpha_data::JsonStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::adjust::{adjust_prediction, AdjustedPrediction};
use crate::analysis::{analyze, Analysis};
use crate::config_store::PredictionConfigStore;
use crate::error::{OptimizerError, Result};
use crate::history::{AnalysisSummary, AppliedChange, HistoryStore, OptimizationEntry};
use crate::summary::OptimizationSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub applied: Vec<AppliedChange>,
    pub auto_apply: bool,
    pub new_version: u64,
}

/// Written to `optimization_report.json` after each optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub timestamp: DateTime<Utc>,
    pub analysis: Analysis,
    pub applied: ApplyResult,
    pub summary: OptimizationSummary,
}

/// Learns prediction weights from backtest results.
#[derive(Debug)]
pub struct PredictionOptimizer {
    config: PredictionConfigStore,
    history: HistoryStore,
    report_path: PathBuf,
    now: Option<DateTime<Utc>>,
}

impl PredictionOptimizer {
    /// Loads the config and history from the data directory.
    #[must_use]
    pub fn open(storage: &StorageConfig) -> Self {
        Self {
            config: PredictionConfigStore::open(storage.path(&storage.prediction_config_file)),
            history: HistoryStore::open(storage.path(&storage.optimization_history_file)),
            report_path: storage.path(&storage.optimization_report_file),
            now: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    #[must_use]
    pub fn config(&self) -> &PredictionConfig {
        self.config.config()
    }

    #[must_use]
    pub fn analyze(&self, weekly: &[VerifiedPrediction], monthly_stocks: &[VerifiedPrediction]) -> Analysis {
        analyze(weekly, monthly_stocks, self.config.config(), self.now())
    }

    /// Records every recommended change; with `auto_apply` also writes them.
    ///
    /// An applied batch bumps the config version exactly once and appends
    /// one history entry. Without `auto_apply` nothing is mutated.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::ConfigWrite`] if the config cannot be
    /// persisted; config, version and history are then unchanged.
    pub fn apply(&mut self, analysis: &Analysis, auto_apply: bool) -> Result<ApplyResult> {
        let current = self.config.config();
        let applied: Vec<AppliedChange> = analysis
            .adjustments
            .iter()
            .map(|a| AppliedChange {
                key: a.key.clone(),
                old: current.get(&a.key),
                new: a.value,
                applied: auto_apply,
            })
            .collect();

        if auto_apply && !applied.is_empty() {
            let now = self.now();
            self.config.apply(&analysis.adjustments, now)?;
            self.history.append(OptimizationEntry {
                timestamp: now,
                changes: applied.clone(),
                analysis_summary: AnalysisSummary {
                    direction: analysis.direction_analysis.clone(),
                    threshold: analysis.threshold_analysis.as_ref().map(|t| t.best_threshold),
                },
            });
        }

        Ok(ApplyResult {
            applied,
            auto_apply,
            new_version: self.config.config().version,
        })
    }

    #[must_use]
    pub fn adjusted_prediction(&self, prediction: &PredictionRecord) -> AdjustedPrediction {
        adjust_prediction(self.config.config(), prediction)
    }

    #[must_use]
    pub fn summary(&self) -> OptimizationSummary {
        OptimizationSummary::build(self.config.config(), self.history.history())
    }

    /// Analyzes the latest persisted backtest results, applies the
    /// recommendations and writes `optimization_report.json`.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::NoBacktestData`] when neither results file
    /// holds a verified stock prediction, or a write error.
    pub fn run(&mut self, storage: &StorageConfig, auto_apply: bool) -> Result<OptimizationReport> {
        let weekly: Option<WeeklyResults> = load_results(&storage.path(&storage.weekly_results_file));
        let monthly: Option<MonthlyResults> = load_results(&storage.path(&storage.monthly_results_file));
        if weekly.is_none() {
            warn!("No weekly backtest results found");
        }
        if monthly.is_none() {
            warn!("No monthly backtest results found");
        }

        let weekly_verified = weekly.map(|w| w.verified).unwrap_or_default();
        let monthly_stocks = monthly.map(|m| m.verified_stocks).unwrap_or_default();
        if weekly_verified.is_empty() && monthly_stocks.is_empty() {
            return Err(OptimizerError::NoBacktestData);
        }

        let analysis = self.analyze(&weekly_verified, &monthly_stocks);
        let applied = self.apply(&analysis, auto_apply)?;

        let report = OptimizationReport {
            timestamp: self.now(),
            analysis,
            applied,
            summary: self.summary(),
        };
        JsonStore::new(&self.report_path)
            .save(&report)
            .map_err(OptimizerError::ReportWrite)?;

        info!(
            recommendations = report.analysis.recommendations.len(),
            changes = report.applied.applied.len(),
            auto_apply,
            version = report.applied.new_version,
            "Optimization complete"
        );
        Ok(report)
    }
}
