use anyhow::Result;
use newsalpha_core::AppConfig;
use newsalpha_scheduler::BacktestScheduler;

/// Runs backtest cycles on the configured cron schedule until killed.
///
/// # Errors
/// Returns an error if the scheduler cannot start.
pub async fn run_daemon(app: AppConfig) -> Result<()> {
    tracing::info!(data_dir = %app.storage.data_dir.display(), "Starting backtest daemon");
    BacktestScheduler::new(app).start().await
}
