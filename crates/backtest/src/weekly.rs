use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use crate::aggregator::{threshold_sweep, AccuracyReport, SWEEP_CANDIDATES};
use crate::extractor::ReportKind;
use crate::pipeline::{BacktestOutcome, Backtester};
use crate::results::{keep_last, WeeklyResults};
use crate::trading::{simulate_trading, DEFAULT_INITIAL_CAPITAL};
use crate::verifier::Verifier;
use newsalpha_data::ArtifactDirectory;

impl Backtester {
    /// Verifies weekly stock calls at the configured bullish threshold and
    /// writes `weekly_backtest_results.json`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the results file cannot be written.
    pub async fn run_weekly(&mut self, lookback_days: i64) -> Result<BacktestOutcome<WeeklyResults>> {
        let dir = ArtifactDirectory::weekly(&self.app.storage);
        let Some(collected) = self.collect(ReportKind::Weekly, &dir, lookback_days) else {
            info!(lookback_days, "No weekly artifacts to backtest");
            return Ok(BacktestOutcome::NoData);
        };

        let mut counts = collected.counts;
        let threshold = self.prediction.threshold();
        let verified = self
            .verify_all(&collected.predictions, Verifier::new(threshold), &mut counts)
            .await;

        let stats = AccuracyReport::build(&verified);
        let sweep = threshold_sweep(&verified, &SWEEP_CANDIDATES, threshold);
        let trading = simulate_trading(&verified, DEFAULT_INITIAL_CAPITAL);

        let results = WeeklyResults {
            run_id: Uuid::new_v4(),
            generated_at: self.now(),
            lookback_days,
            threshold,
            counts,
            verified: keep_last(verified, self.app.backtest.weekly_keep),
            stats,
            threshold_sweep: sweep,
            trading,
        };
        self.persist(&self.app.storage.weekly_results_file, &results)?;

        info!(
            run_id = %results.run_id,
            verified = counts.verified,
            pending = counts.pending,
            unresolved = counts.unresolved,
            accuracy = results.stats.overall.accuracy_rounded(),
            "Weekly backtest complete"
        );
        Ok(BacktestOutcome::Completed(results))
    }
}
