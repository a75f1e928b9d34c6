//! Console rendering of backtest results.

use newsalpha_core::ReportFormatter;

use crate::aggregator::AccuracyReport;
use crate::results::{HourlyResults, MonthlyResults, RunCounts, WeeklyResults};

/// Direction keys in display order.
const DIRECTIONS: [&str; 6] = ["up", "down", "flat", "bullish", "bearish", "neutral"];

fn counts(out: &mut ReportFormatter, counts: &RunCounts) {
    out.field("Artifacts", counts.artifacts)
        .field("Skipped artifacts", counts.skipped_artifacts)
        .field("Predictions", counts.extracted)
        .field("Pending", counts.pending)
        .field("Unresolved", counts.unresolved)
        .field("Verified", counts.verified);
}

fn accuracy(out: &mut ReportFormatter, report: &AccuracyReport) {
    out.stats("Overall", &report.overall);
    for direction in DIRECTIONS {
        if let Some(stats) = report.by_direction.get(direction) {
            out.stats(&format!("  {direction}"), &stats.stats);
        }
    }
    for (region, stats) in &report.by_market {
        out.stats(&format!("  market {region}"), stats);
    }
    out.stats("  high confidence", &report.by_confidence.high)
        .stats("  low confidence", &report.by_confidence.low);
}

#[must_use]
pub fn render_weekly(results: &WeeklyResults) -> String {
    let mut out = ReportFormatter::new();
    out.section("Weekly predictions");
    counts(&mut out, &results.counts);
    out.field("Threshold", format!("{:.1}%", results.threshold));
    accuracy(&mut out, &results.stats);

    if let Some(sweep) = &results.threshold_sweep {
        out.field(
            "Best threshold",
            format!("{:.1}% ({:.1}% accuracy)", sweep.best_threshold, sweep.best_accuracy),
        );
    }
    let trading = &results.trading;
    if trading.total_trades > 0 {
        out.field(
            "Paper trading",
            format!(
                "{} trades, {:.2}% return, {:.1}% win rate, {:.2}% max drawdown",
                trading.total_trades, trading.total_return, trading.win_rate, trading.max_drawdown
            ),
        );
    }
    out.blank();
    out.finish()
}

#[must_use]
pub fn render_monthly(results: &MonthlyResults) -> String {
    let mut out = ReportFormatter::new();
    out.section("Monthly predictions");
    counts(&mut out, &results.counts);
    out.line("Stock picks:");
    accuracy(&mut out, &results.stats.stock_predictions);
    out.line("Events:").stats("Overall", &results.stats.event_predictions.overall);
    out.blank();
    out.finish()
}

#[must_use]
pub fn render_hourly(results: &HourlyResults) -> String {
    let mut out = ReportFormatter::new();
    out.section("Hourly reports");
    counts(&mut out, &results.counts);
    accuracy(&mut out, &results.stats);
    out.blank();
    out.finish()
}
