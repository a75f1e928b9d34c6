pub mod config;
pub mod config_loader;
pub mod prediction;
pub mod prediction_config;
pub mod report_formatter;
pub mod stats;

pub use config::{AppConfig, BacktestConfig, MarketDataConfig, SchedulerConfig, StorageConfig};
pub use config_loader::ConfigLoader;
pub use prediction::{
    Direction, Instrument, Market, PredictionRecord, Source, Target, VerifiedPrediction,
};
pub use prediction_config::{ConfigKey, PredictionConfig, Thresholds};
pub use report_formatter::ReportFormatter;
pub use stats::{binomial_test, wilson_ci, AccuracyStats};
