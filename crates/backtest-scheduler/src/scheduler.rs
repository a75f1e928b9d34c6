use anyhow::Result;
use newsalpha_core::{AccuracyStats, AppConfig};
use newsalpha_optimizer::report::headline;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::cycle::{run_cycle, CycleOptions, CycleReport};

pub struct BacktestScheduler {
    app: AppConfig,
}

impl BacktestScheduler {
    #[must_use]
    pub fn new(app: AppConfig) -> Self {
        Self { app }
    }

    /// Starts the scheduler and runs a full cycle on the cron schedule.
    ///
    /// # Errors
    /// Returns an error if the scheduler fails to start or if the cron
    /// expression is invalid.
    pub async fn start(self) -> Result<()> {
        if !self.app.scheduler.enabled {
            info!("Backtest scheduler is disabled");
            return Ok(());
        }

        info!(cron = %self.app.scheduler.cron_schedule, "Starting backtest scheduler");

        let scheduler = JobScheduler::new().await?;
        let app = self.app.clone();
        let cron_schedule = app.scheduler.cron_schedule.clone();

        let job = Job::new_async(cron_schedule.as_str(), move |_uuid, _lock| {
            let app = app.clone();
            Box::pin(async move {
                match run_cycle(&app, &CycleOptions::from_config(&app)).await {
                    Ok(report) => log_cycle(&report),
                    Err(e) => error!("Scheduled backtest cycle failed: {e:#}"),
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Backtest scheduler started successfully");

        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
        }
    }

    /// Runs one cycle immediately.
    ///
    /// # Errors
    /// Returns an error if the price client cannot be built.
    pub async fn run_once(&self) -> Result<CycleReport> {
        let report = run_cycle(&self.app, &CycleOptions::from_config(&self.app)).await?;
        log_cycle(&report);
        Ok(report)
    }
}

fn log_cycle(report: &CycleReport) {
    if let Some(summary) = &report.summary {
        let show = |stats: &Option<AccuracyStats>| stats.as_ref().map_or_else(|| "not run".to_string(), headline);
        info!(
            weekly = %show(&summary.weekly),
            monthly_stocks = %show(&summary.monthly_stocks),
            monthly_events = %show(&summary.monthly_events),
            hourly = %show(&summary.hourly),
            "Backtest accuracy"
        );
    }
    if let Some(optimization) = &report.optimization {
        info!(
            recommendations = optimization.analysis.recommendations.len(),
            applied = optimization.applied.applied.len(),
            "Optimization result"
        );
    }
    for e in &report.errors {
        warn!(error = %e, "Cycle step reported an error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_scheduler_returns_immediately() {
        let mut app = AppConfig::default();
        app.scheduler.enabled = false;
        BacktestScheduler::new(app).start().await.unwrap();
    }

    #[test]
    fn default_cron_is_accepted() {
        let app = AppConfig::default();
        assert!(Job::new_async(app.scheduler.cron_schedule.as_str(), |_uuid, _lock| Box::pin(async {})).is_ok());
    }
}
