//! Summary command: current config, recent accuracy, and last backtest headlines.

use newsalpha_backtest::{load_results, BacktestSummary};
use newsalpha_core::{AccuracyStats, AppConfig, ReportFormatter};
use newsalpha_optimizer::report::{headline, render_summary};
use newsalpha_optimizer::PredictionOptimizer;

pub fn run_summary(app: &AppConfig) {
    let optimizer = PredictionOptimizer::open(&app.storage);
    print!("{}", render_summary(&optimizer.summary()));

    let path = app.storage.path(&app.storage.summary_file);
    match load_results::<BacktestSummary>(&path) {
        Some(summary) => print!("{}", render_backtest_summary(&summary)),
        None => println!("No backtest summary yet."),
    }
}

fn render_backtest_summary(summary: &BacktestSummary) -> String {
    let show = |stats: &Option<AccuracyStats>| stats.as_ref().map_or_else(|| "not run".to_string(), headline);

    let mut out = ReportFormatter::new();
    out.section("Last backtest")
        .field("Generated", summary.generated_at.format("%Y-%m-%d %H:%M UTC"))
        .field("Weekly", show(&summary.weekly))
        .field("Monthly stocks", show(&summary.monthly_stocks))
        .field("Monthly events", show(&summary.monthly_events))
        .field("Hourly", show(&summary.hourly));
    if let Some(trading) = &summary.trading {
        out.field("Paper trading return", format!("{:.2}%", trading.total_return));
    }
    out.finish()
}
