//! Optimize command: analyze the latest backtest results.

use anyhow::Result;
use clap::Args;
use newsalpha_core::AppConfig;
use newsalpha_optimizer::report::render_report;
use newsalpha_optimizer::{OptimizerError, PredictionOptimizer};

/// Arguments for the optimize command.
#[derive(Args, Debug, Clone, Default)]
pub struct OptimizeArgs {
    /// Report recommendations without changing the prediction config
    #[arg(long)]
    pub dry_run: bool,
}

/// Runs the optimize command.
///
/// # Errors
/// Returns an error if the updated config or the report cannot be written.
pub fn run_optimize(app: &AppConfig, args: &OptimizeArgs) -> Result<()> {
    let mut optimizer = PredictionOptimizer::open(&app.storage);
    match optimizer.run(&app.storage, !args.dry_run) {
        Ok(report) => {
            print!("{}", render_report(&report));
            Ok(())
        }
        Err(OptimizerError::NoBacktestData) => {
            println!("No backtest results to analyze. Run `newsalpha backtest` first.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
