use anyhow::{Context, Result};
use chrono::Utc;
use newsalpha_backtest::report::{render_hourly, render_monthly, render_weekly};
use newsalpha_backtest::{
    BacktestOutcome, BacktestSummary, Backtester, HourlyResults, MonthlyResults, WeeklyResults,
};
use newsalpha_core::AppConfig;
use newsalpha_data::{MarketDataClient, PriceSource};
use newsalpha_optimizer::report::render_report;
use newsalpha_optimizer::{OptimizationReport, OptimizerError, PredictionOptimizer};
use std::sync::Arc;
use tracing::{error, info};

/// Which steps a cycle runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOptions {
    pub weekly: bool,
    pub monthly: bool,
    pub hourly: bool,
    /// Weekly and hourly lookback; monthly uses this times the configured multiplier.
    pub lookback_days: i64,
    pub optimize: bool,
    pub auto_apply: bool,
}

impl CycleOptions {
    /// The scheduled cycle as configured.
    #[must_use]
    pub fn from_config(app: &AppConfig) -> Self {
        Self {
            weekly: true,
            monthly: true,
            hourly: app.scheduler.include_hourly,
            lookback_days: app.scheduler.lookback_days,
            optimize: true,
            auto_apply: app.scheduler.auto_apply,
        }
    }
}

/// What one cycle produced. Step failures are collected in `errors`.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub weekly: Option<BacktestOutcome<WeeklyResults>>,
    pub monthly: Option<BacktestOutcome<MonthlyResults>>,
    pub hourly: Option<BacktestOutcome<HourlyResults>>,
    pub summary: Option<BacktestSummary>,
    pub optimization: Option<OptimizationReport>,
    pub errors: Vec<String>,
}

impl CycleReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable report of every step that ran.
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = String::new();
        let mut push = |label: &str, rendered: Option<String>| match rendered {
            Some(r) => text.push_str(&r),
            None => text.push_str(&format!("{label}: no artifacts in the lookback window\n\n")),
        };

        if let Some(outcome) = &self.weekly {
            push("Weekly", outcome.completed().map(render_weekly));
        }
        if let Some(outcome) = &self.monthly {
            push("Monthly", outcome.completed().map(render_monthly));
        }
        if let Some(outcome) = &self.hourly {
            push("Hourly", outcome.completed().map(render_hourly));
        }
        if let Some(report) = &self.optimization {
            text.push_str(&render_report(report));
        }
        for e in &self.errors {
            text.push_str(&format!("error: {e}\n"));
        }
        text
    }
}

/// Runs a cycle against the configured HTTP price providers.
///
/// # Errors
///
/// Returns an error only if the HTTP client cannot be built.
pub async fn run_cycle(app: &AppConfig, options: &CycleOptions) -> Result<CycleReport> {
    let client = MarketDataClient::new(&app.market_data).context("Failed to build market data client")?;
    Ok(run_cycle_with(app, options, Arc::new(client)).await)
}

/// Backtests each selected kind, writes the combined summary, then analyzes
/// and applies optimizations. A failing step is logged and recorded; the
/// remaining steps still run.
pub async fn run_cycle_with(app: &AppConfig, options: &CycleOptions, source: Arc<dyn PriceSource>) -> CycleReport {
    info!(?options, "Starting backtest cycle");
    let mut report = CycleReport::default();

    let prediction = PredictionOptimizer::open(&app.storage).config().clone();
    let mut backtester = Backtester::new(app.clone(), prediction, source);

    if options.weekly {
        report.weekly = record(&mut report.errors, "weekly backtest", backtester.run_weekly(options.lookback_days).await);
    }
    if options.monthly {
        let days = options.lookback_days * app.backtest.monthly_lookback_multiplier;
        report.monthly = record(&mut report.errors, "monthly backtest", backtester.run_monthly(days).await);
    }
    if options.hourly {
        report.hourly = record(&mut report.errors, "hourly backtest", backtester.run_hourly(options.lookback_days).await);
    }
    backtester.finish();

    let weekly = report.weekly.as_ref().and_then(BacktestOutcome::completed);
    let monthly = report.monthly.as_ref().and_then(BacktestOutcome::completed);
    let hourly = report.hourly.as_ref().and_then(BacktestOutcome::completed);
    if weekly.is_some() || monthly.is_some() || hourly.is_some() {
        let summary = BacktestSummary::from_runs(weekly, monthly, hourly, Utc::now());
        if let Err(e) = backtester.save_summary(&summary) {
            error!(error = %e, "Failed to write backtest summary");
            report.errors.push(format!("backtest summary: {e:#}"));
        }
        report.summary = Some(summary);
    }

    if options.optimize {
        let mut optimizer = PredictionOptimizer::open(&app.storage);
        match optimizer.run(&app.storage, options.auto_apply) {
            Ok(optimization) => report.optimization = Some(optimization),
            Err(OptimizerError::NoBacktestData) => info!("Nothing verified yet, skipping optimization"),
            Err(e) => {
                error!(error = %e, "Optimization failed");
                report.errors.push(format!("optimization: {e}"));
            }
        }
    }

    info!(errors = report.errors.len(), "Backtest cycle finished");
    report
}

fn record<T>(errors: &mut Vec<String>, step: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(step, error = %e, "Cycle step failed");
            errors.push(format!("{step}: {e:#}"));
            None
        }
    }
}
