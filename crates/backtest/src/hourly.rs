use anyhow::Result;
use newsalpha_data::ArtifactDirectory;
use tracing::info;
use uuid::Uuid;

use crate::aggregator::AccuracyReport;
use crate::extractor::ReportKind;
use crate::pipeline::{BacktestOutcome, Backtester};
use crate::results::{keep_last, HourlyResults};
use crate::verifier::Verifier;

impl Backtester {
    /// Verifies next-day calls from the plain-text hourly reports and writes
    /// `hourly_backtest_results.json`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the results file cannot be written.
    pub async fn run_hourly(&mut self, lookback_days: i64) -> Result<BacktestOutcome<HourlyResults>> {
        let dir = ArtifactDirectory::hourly(&self.app.storage);
        let Some(collected) = self.collect(ReportKind::Hourly, &dir, lookback_days) else {
            info!(lookback_days, "No hourly reports to backtest");
            return Ok(BacktestOutcome::NoData);
        };

        let mut counts = collected.counts;
        let threshold = self.app.backtest.hourly_threshold;
        let verified = self
            .verify_all(&collected.predictions, Verifier::new(threshold), &mut counts)
            .await;

        let results = HourlyResults {
            run_id: Uuid::new_v4(),
            generated_at: self.now(),
            lookback_days,
            threshold,
            counts,
            stats: AccuracyReport::build(&verified),
            verified: keep_last(verified, self.app.backtest.hourly_keep),
        };
        self.persist(&self.app.storage.hourly_results_file, &results)?;

        info!(
            run_id = %results.run_id,
            verified = counts.verified,
            accuracy = results.stats.overall.accuracy_rounded(),
            "Hourly backtest complete"
        );
        Ok(BacktestOutcome::Completed(results))
    }
}
