use anyhow::Result;
use newsalpha_core::PredictionRecord;
use newsalpha_data::ArtifactDirectory;
use tracing::info;
use uuid::Uuid;

use crate::aggregator::AccuracyReport;
use crate::extractor::ReportKind;
use crate::pipeline::{BacktestOutcome, Backtester};
use crate::results::{keep_last, MonthlyResults, MonthlyStats};
use crate::verifier::Verifier;

impl Backtester {
    /// Verifies monthly buy/sell picks and event stances, each at its own
    /// threshold, and writes `monthly_backtest_results.json`.
    ///
    /// The caller picks the lookback; the CLI and scheduler pass
    /// `days * monthly_lookback_multiplier`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the results file cannot be written.
    pub async fn run_monthly(&mut self, lookback_days: i64) -> Result<BacktestOutcome<MonthlyResults>> {
        let dir = ArtifactDirectory::monthly(&self.app.storage);
        let Some(collected) = self.collect(ReportKind::Monthly, &dir, lookback_days) else {
            info!(lookback_days, "No monthly artifacts to backtest");
            return Ok(BacktestOutcome::NoData);
        };

        let (events, stocks): (Vec<&PredictionRecord>, Vec<&PredictionRecord>) =
            collected.predictions.iter().partition(|p| p.is_event());

        let mut counts = collected.counts;
        let stock_threshold = self.app.backtest.monthly_stock_threshold;
        let event_threshold = self.app.backtest.event_threshold;
        let verified_stocks = self
            .verify_all(stocks, Verifier::new(stock_threshold), &mut counts)
            .await;
        let verified_events = self
            .verify_all(events, Verifier::new(event_threshold), &mut counts)
            .await;

        let stats = MonthlyStats {
            stock_predictions: AccuracyReport::build(&verified_stocks),
            event_predictions: AccuracyReport::build(&verified_events),
        };

        let results = MonthlyResults {
            run_id: Uuid::new_v4(),
            generated_at: self.now(),
            lookback_days,
            stock_threshold,
            event_threshold,
            counts,
            verified_stocks: keep_last(verified_stocks, self.app.backtest.monthly_stock_keep),
            verified_events: keep_last(verified_events, self.app.backtest.monthly_event_keep),
            stats,
        };
        self.persist(&self.app.storage.monthly_results_file, &results)?;

        info!(
            run_id = %results.run_id,
            stocks = results.stats.stock_predictions.overall.total,
            events = results.stats.event_predictions.overall.total,
            pending = counts.pending,
            unresolved = counts.unresolved,
            "Monthly backtest complete"
        );
        Ok(BacktestOutcome::Completed(results))
    }
}
