//! Console rendering of optimization runs.

use newsalpha_core::{AccuracyStats, ReportFormatter};

use crate::optimizer::OptimizationReport;
use crate::summary::OptimizationSummary;

#[must_use]
pub fn render_report(report: &OptimizationReport) -> String {
    let analysis = &report.analysis;
    let mut out = ReportFormatter::new();
    out.banner("PREDICTION OPTIMIZER");

    out.section("Direction accuracy");
    for (direction, data) in &analysis.direction_analysis {
        let label = if data.insufficient_data {
            format!("{direction} (insufficient data)")
        } else {
            direction.clone()
        };
        out.stats(&label, &data.stats.stats);
    }
    out.blank();

    if let Some(sweep) = &analysis.threshold_analysis {
        out.section("Threshold")
            .field("Current", format!("{}%", sweep.current_threshold))
            .field("Best", format!("{}% ({}% accuracy)", sweep.best_threshold, sweep.best_accuracy))
            .blank();
    }

    if !analysis.source_analysis.is_empty() {
        out.section("Source reliability");
        for (source, data) in &analysis.source_analysis {
            out.field(
                source,
                format!(
                    "{}/{} ({}%), suggested weight {:.2}",
                    data.correct, data.total, data.accuracy, data.suggested_weight
                ),
            );
        }
        out.blank();
    }

    out.section("Recommendations");
    if analysis.recommendations.is_empty() {
        out.line("No changes recommended");
    }
    for recommendation in &analysis.recommendations {
        out.line(&format!("- {recommendation}"));
    }
    out.blank();

    let applied = &report.applied;
    if !applied.applied.is_empty() {
        out.section(if applied.auto_apply { "Applied" } else { "Proposed (dry run)" });
        for change in &applied.applied {
            let old = change.old.map_or_else(|| "N/A".to_string(), |v| v.to_string());
            out.field(&change.key.to_string(), format!("{old} -> {}", change.new));
        }
        out.field("Config version", applied.new_version).blank();
    }

    out.finish()
}

#[must_use]
pub fn render_summary(summary: &OptimizationSummary) -> String {
    let config = &summary.current_config;
    let mut out = ReportFormatter::new();
    out.banner("OPTIMIZATION SUMMARY")
        .field("Version", summary.version)
        .field("Last updated", summary.last_updated.format("%Y-%m-%d %H:%M:%S"))
        .field("Optimizations", summary.total_optimizations)
        .field("Threshold", format!("±{}%", config.thresholds.bullish))
        .field("Min confidence", config.min_confidence)
        .blank();

    out.section("Signal weights");
    for (direction, weight) in &config.signal_weights {
        out.field(direction, weight);
    }
    out.blank();

    if !summary.accuracy_trend.is_empty() {
        out.section("Accuracy trend");
        for point in &summary.accuracy_trend {
            out.field(&point.date.to_string(), format!("{}%", point.accuracy));
        }
        out.blank();
    }

    let list = |items: &[String]| if items.is_empty() { "none".to_string() } else { items.join(", ") };
    out.field("Difficult stocks", list(&summary.difficult_stocks))
        .field("Reliable sources", list(&summary.reliable_sources));
    out.finish()
}

/// One-line headline for logs and the scheduler.
#[must_use]
pub fn headline(stats: &AccuracyStats) -> String {
    if stats.total == 0 {
        "no verified predictions".to_string()
    } else {
        format!("{}/{} correct ({:.1}%)", stats.correct, stats.total, stats.accuracy)
    }
}
