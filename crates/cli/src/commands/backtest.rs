//! Backtest command: verify past predictions, then optimize.

use anyhow::Result;
use clap::Args;
use newsalpha_core::AppConfig;
use newsalpha_scheduler::{run_cycle, CycleOptions};

/// Arguments for the backtest command.
#[derive(Args, Debug, Clone, Default)]
pub struct BacktestArgs {
    /// Backtest weekly analyses (default when no kind is selected)
    #[arg(long)]
    pub weekly: bool,

    /// Backtest monthly stock picks and events (default when no kind is selected)
    #[arg(long)]
    pub monthly: bool,

    /// Backtest hourly sentiment reports
    #[arg(long)]
    pub hourly: bool,

    /// Lookback window in days (monthly uses a multiple of it)
    #[arg(long)]
    pub days: Option<i64>,

    /// Skip the optimization step
    #[arg(long)]
    pub skip_optimize: bool,

    /// Report recommendations without changing the prediction config
    #[arg(long)]
    pub dry_run: bool,
}

impl BacktestArgs {
    /// Weekly and monthly run unless some kind is named explicitly.
    #[must_use]
    pub fn cycle_options(&self, app: &AppConfig) -> CycleOptions {
        let any = self.weekly || self.monthly || self.hourly;
        CycleOptions {
            weekly: self.weekly || !any,
            monthly: self.monthly || !any,
            hourly: self.hourly,
            lookback_days: self.days.unwrap_or(app.backtest.lookback_days),
            optimize: !self.skip_optimize,
            auto_apply: !self.dry_run,
        }
    }
}

/// Runs the backtest command.
///
/// # Errors
/// Returns an error if the market data client cannot be built.
pub async fn run_backtest(app: &AppConfig, args: &BacktestArgs) -> Result<()> {
    let options = args.cycle_options(app);
    let report = run_cycle(app, &options).await?;
    print!("{}", report.render());
    if options.optimize && report.optimization.is_none() && report.is_clean() {
        println!("No verified predictions yet; optimization skipped.");
    }
    Ok(())
}
