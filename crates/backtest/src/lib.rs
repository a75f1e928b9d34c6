//! Prediction backtesting.
//!
//! Report artifacts are decoded into [`PredictionRecord`](newsalpha_core::PredictionRecord)s,
//! matured predictions are checked against realized price moves, and the
//! results are aggregated and written back to the data directory.

pub mod aggregator;
pub mod extractor;
mod hourly;
mod monthly;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod trading;
pub mod verifier;
mod weekly;

pub use aggregator::{
    aggregate, group_by, threshold_sweep, AccuracyReport, DirectionStats, ThresholdSweep,
    SWEEP_CANDIDATES,
};
pub use extractor::{KeywordRules, PredictionExtractor, ReportArtifact, ReportKind};
pub use pipeline::{BacktestOutcome, Backtester};
pub use results::{
    load_results, BacktestSummary, HourlyResults, MonthlyResults, MonthlyStats, RunCounts,
    WeeklyResults,
};
pub use trading::{simulate_trading, TradeSimulator, TradingPerformance};
pub use verifier::{classify, is_correct, is_mature, Verifier};
