//! Adjust command: weight a single prediction with the current config.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use newsalpha_core::{AppConfig, Direction, PredictionRecord, Source, Target};
use newsalpha_optimizer::PredictionOptimizer;

/// Arguments for the adjust command.
#[derive(Args, Debug, Clone)]
pub struct AdjustArgs {
    /// Stock symbol (e.g., "600519", "AAPL")
    #[arg(long)]
    pub symbol: String,

    /// Predicted direction (up, down, flat, bullish, bearish, neutral)
    #[arg(long)]
    pub direction: Direction,

    /// Prediction source (weekly_analysis, monthly_buy, monthly_sell, monthly_event, sentiment, news)
    #[arg(long)]
    pub source: Source,

    /// Raw confidence in [0, 1]; defaults to the source's usual confidence
    #[arg(long)]
    pub confidence: Option<f64>,
}

impl AdjustArgs {
    #[must_use]
    pub fn record(&self) -> PredictionRecord {
        let record = PredictionRecord::new(
            Target::symbol(self.symbol.trim()),
            Local::now().date_naive(),
            self.direction,
            self.source,
        );
        match self.confidence {
            Some(c) => record.with_confidence(c),
            None => record,
        }
    }
}

/// Runs the adjust command and prints the adjusted prediction as JSON.
///
/// # Errors
/// Returns an error if the result cannot be serialized.
pub fn run_adjust(app: &AppConfig, args: &AdjustArgs) -> Result<()> {
    let optimizer = PredictionOptimizer::open(&app.storage);
    let adjusted = optimizer.adjusted_prediction(&args.record());
    let json = serde_json::to_string_pretty(&adjusted).context("Failed to serialize adjusted prediction")?;
    println!("{json}");
    Ok(())
}
