//! Subcommands of the `newsalpha` binary.

pub mod adjust;
pub mod backtest;
pub mod daemon;
pub mod optimize;
pub mod summary;

pub use adjust::{run_adjust, AdjustArgs};
pub use backtest::{run_backtest, BacktestArgs};
pub use daemon::run_daemon;
pub use optimize::{run_optimize, OptimizeArgs};
pub use summary::run_summary;
