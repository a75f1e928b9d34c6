//! Shared backtest machinery: artifact loading, age gating, verification,
//! and result persistence. The per-kind runs live in `weekly`, `monthly`
//! and `hourly`.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use newsalpha_core::{AppConfig, PredictionConfig, PredictionRecord, VerifiedPrediction};
use newsalpha_data::{
    ArtifactDirectory, JsonStore, MarketDataClient, PriceCache, PriceOutcomeResolver, PriceSource,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::extractor::{PredictionExtractor, ReportArtifact, ReportKind};
use crate::results::{BacktestSummary, RunCounts};
use crate::verifier::{is_mature, Verifier};

/// Result of one backtest run.
#[derive(Debug, Clone, PartialEq)]
pub enum BacktestOutcome<T> {
    /// No artifact in the lookback window could be loaded.
    NoData,
    Completed(T),
}

impl<T> BacktestOutcome<T> {
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    #[must_use]
    pub const fn completed(&self) -> Option<&T> {
        match self {
            Self::NoData => None,
            Self::Completed(results) => Some(results),
        }
    }

    #[must_use]
    pub fn into_completed(self) -> Option<T> {
        match self {
            Self::NoData => None,
            Self::Completed(results) => Some(results),
        }
    }
}

/// Predictions extracted from the artifacts of one kind.
#[derive(Debug, Default)]
pub(crate) struct Collected {
    pub counts: RunCounts,
    pub predictions: Vec<PredictionRecord>,
}

/// Runs backtests against one price source and prediction config.
///
/// Holds the price cache for its lifetime; call [`Backtester::finish`] to
/// persist newly fetched series.
pub struct Backtester {
    pub(crate) app: AppConfig,
    pub(crate) prediction: PredictionConfig,
    pub(crate) resolver: PriceOutcomeResolver,
    pub(crate) extractor: PredictionExtractor,
    now: Option<DateTime<Utc>>,
}

impl Backtester {
    /// Uses the on-disk price cache under the data directory.
    #[must_use]
    pub fn new(app: AppConfig, prediction: PredictionConfig, source: Arc<dyn PriceSource>) -> Self {
        let cache = PriceCache::open(app.storage.path(&app.storage.price_cache_file));
        Self::with_cache(app, prediction, source, cache)
    }

    #[must_use]
    pub fn with_cache(
        app: AppConfig,
        prediction: PredictionConfig,
        source: Arc<dyn PriceSource>,
        cache: PriceCache,
    ) -> Self {
        let resolver = PriceOutcomeResolver::new(source, cache, app.market_data.benchmarks.clone());
        let extractor = PredictionExtractor::from_config(&app.backtest, &prediction);
        Self {
            app,
            prediction,
            resolver,
            extractor,
            now: None,
        }
    }

    /// Prices outcomes over HTTP using the configured providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(app: AppConfig, prediction: PredictionConfig) -> Result<Self> {
        let client = MarketDataClient::new(&app.market_data).context("Failed to build market data client")?;
        Ok(Self::new(app, prediction, Arc::new(client)))
    }

    /// Pins the clock, for reproducible runs.
    #[must_use]
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self.resolver.set_today(now.with_timezone(&Local).date_naive());
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: PredictionExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn app_config(&self) -> &AppConfig {
        &self.app
    }

    #[must_use]
    pub fn prediction_config(&self) -> &PredictionConfig {
        &self.prediction
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Artifact timestamps are local wall-clock times.
    fn today_local(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }

    /// LOAD and EXTRACT. `None` when no artifact in the window decodes.
    pub(crate) fn collect(&self, kind: ReportKind, dir: &ArtifactDirectory, lookback_days: i64) -> Option<Collected> {
        let since = self.now().with_timezone(&Local).naive_local() - Duration::days(lookback_days.max(0));
        let files = dir.list_since(since);

        let mut collected = Collected::default();
        for file in &files {
            match ReportArtifact::load(kind, file) {
                Ok(artifact) => {
                    collected.counts.artifacts += 1;
                    collected.predictions.extend(self.extractor.extract(&artifact));
                }
                Err(e) => {
                    collected.counts.skipped_artifacts += 1;
                    warn!(path = %file.path.display(), error = %e, "Skipping malformed artifact");
                }
            }
        }
        collected.counts.extracted = collected.predictions.len();

        info!(
            kind = ?kind,
            dir = %dir.dir().display(),
            artifacts = collected.counts.artifacts,
            skipped = collected.counts.skipped_artifacts,
            predictions = collected.counts.extracted,
            "Loaded report artifacts"
        );

        (collected.counts.artifacts > 0).then_some(collected)
    }

    /// FILTER_BY_AGE and VERIFY. Young predictions count as pending and
    /// unresolvable ones as unresolved; neither enters the statistics.
    pub(crate) async fn verify_all<'a, I>(
        &mut self,
        predictions: I,
        verifier: Verifier,
        counts: &mut RunCounts,
    ) -> Vec<VerifiedPrediction>
    where
        I: IntoIterator<Item = &'a PredictionRecord>,
    {
        let today = self.today_local();
        let buffer = self.app.backtest.age_buffer_days;
        let verified_at = self.now();

        let mut verified = Vec::new();
        for prediction in predictions {
            if !is_mature(prediction, today, buffer) {
                counts.pending += 1;
                continue;
            }
            match verifier.verify(prediction, &mut self.resolver, verified_at).await {
                Some(v) => verified.push(v),
                None => counts.unresolved += 1,
            }
        }
        counts.verified += verified.len();

        debug!(
            threshold = verifier.threshold(),
            verified = verified.len(),
            pending = counts.pending,
            unresolved = counts.unresolved,
            "Verification pass complete"
        );
        verified
    }

    /// Writes a results document into the data directory.
    pub(crate) fn persist<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.app.storage.path(file);
        JsonStore::new(&path)
            .save(value)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Writes `backtest_summary.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_summary(&self, summary: &BacktestSummary) -> Result<()> {
        self.persist(&self.app.storage.summary_file, summary)
    }

    /// Persists newly fetched price series.
    pub fn finish(&mut self) {
        self.resolver.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use newsalpha_core::Instrument;
    use newsalpha_data::{PriceBar, PriceError};
    use tempfile::TempDir;

    struct NoPrices;

    #[async_trait]
    impl PriceSource for NoPrices {
        async fn daily_bars(
            &self,
            _instrument: &Instrument,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceBar>, PriceError> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "none"
        }
    }

    fn backtester(dir: &TempDir) -> Backtester {
        let mut app = AppConfig::default();
        app.storage.data_dir = dir.path().to_path_buf();
        Backtester::with_cache(app, PredictionConfig::default(), Arc::new(NoPrices), PriceCache::in_memory())
            .with_clock("2025-02-01T12:00:00Z".parse().unwrap())
    }

    // ============================================================
    // Loading
    // ============================================================

    #[test]
    fn missing_directory_is_no_data() {
        let dir = TempDir::new().unwrap();
        let bt = backtester(&dir);
        let weekly = ArtifactDirectory::weekly(&bt.app.storage);
        assert!(bt.collect(ReportKind::Weekly, &weekly, 30).is_none());
    }

    #[test]
    fn malformed_artifacts_are_counted_and_skipped() {
        let dir = TempDir::new().unwrap();
        let weekly_dir = dir.path().join("weekly");
        std::fs::create_dir_all(&weekly_dir).unwrap();
        std::fs::write(weekly_dir.join("analysis_20250120_090000.json"), "[1, 2]").unwrap();
        std::fs::write(
            weekly_dir.join("analysis_20250121_090000.json"),
            r#"{"stocks": [{"symbol": "600519", "prediction": "看涨"}]}"#,
        )
        .unwrap();

        let bt = backtester(&dir);
        let collected = bt
            .collect(ReportKind::Weekly, &ArtifactDirectory::weekly(&bt.app.storage), 30)
            .unwrap();

        assert_eq!(collected.counts.artifacts, 1);
        assert_eq!(collected.counts.skipped_artifacts, 1);
        assert_eq!(collected.counts.extracted, 1);
    }

    #[tokio::test]
    async fn young_and_unresolvable_predictions_are_counted() {
        let dir = TempDir::new().unwrap();
        let mut bt = backtester(&dir);
        let old = PredictionRecord::new(
            newsalpha_core::Target::symbol("AAA"),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            newsalpha_core::Direction::Up,
            newsalpha_core::Source::WeeklyAnalysis,
        );
        let young = PredictionRecord {
            anchor_date: NaiveDate::from_ymd_opt(2025, 1, 30).unwrap(),
            ..old.clone()
        };

        let mut counts = RunCounts::default();
        let verified = bt.verify_all([&old, &young], Verifier::new(1.0), &mut counts).await;

        assert!(verified.is_empty());
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.unresolved, 1);
        assert_eq!(counts.verified, 0);
    }

    #[test]
    fn outcome_accessors() {
        let done: BacktestOutcome<u8> = BacktestOutcome::Completed(3);
        assert_eq!(done.completed(), Some(&3));
        assert!(BacktestOutcome::<u8>::NoData.is_no_data());
        assert_eq!(done.into_completed(), Some(3));
    }
}
