//! One backtest-then-optimize cycle, run on demand or on a cron schedule.

pub mod cycle;
pub mod scheduler;

pub use cycle::{run_cycle, run_cycle_with, CycleOptions, CycleReport};
pub use scheduler::BacktestScheduler;
