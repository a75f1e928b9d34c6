use newsalpha_data::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    /// Neither weekly nor monthly results hold a verified stock prediction.
    #[error("no backtest results to analyze")]
    NoBacktestData,

    /// The new config could not be written; nothing was changed.
    #[error("failed to persist prediction config: {0}")]
    ConfigWrite(#[source] StoreError),

    #[error("failed to write optimization report: {0}")]
    ReportWrite(#[source] StoreError),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
