//! Learns prediction weights and thresholds from backtest accuracy.
//!
//! [`PredictionOptimizer`] reads the latest backtest results, recommends
//! changes to the versioned [`PredictionConfig`](newsalpha_core::PredictionConfig),
//! applies them as one batch, and keeps an append-only history.

pub mod adjust;
pub mod analysis;
pub mod config_store;
pub mod error;
pub mod history;
pub mod optimizer;
pub mod report;
pub mod summary;

pub use adjust::{adjust_prediction, AdjustedPrediction, AppliedWeights};
pub use analysis::{analyze, Adjustment, Analysis, DirectionAnalysis, WeightAnalysis};
pub use config_store::PredictionConfigStore;
pub use error::OptimizerError;
pub use history::{AppliedChange, HistoryStore, OptimizationEntry, OptimizationHistory, TrendPoint};
pub use optimizer::{ApplyResult, OptimizationReport, PredictionOptimizer};
pub use summary::OptimizationSummary;
