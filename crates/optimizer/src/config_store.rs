//! The persisted, versioned [`PredictionConfig`].

use chrono::{DateTime, Utc};
use newsalpha_core::PredictionConfig;
use newsalpha_data::JsonStore;
use std::path::PathBuf;
use tracing::info;

use crate::analysis::Adjustment;
use crate::error::{OptimizerError, Result};

/// Owns the prediction config and the file it lives in.
///
/// The in-memory copy only changes after the new document is on disk, so a
/// failed write leaves both the file and [`PredictionConfigStore::config`]
/// at the previous version.
#[derive(Debug)]
pub struct PredictionConfigStore {
    store: JsonStore,
    config: PredictionConfig,
}

impl PredictionConfigStore {
    /// Loads the config, filling missing sections from defaults. A missing or
    /// unreadable file yields the defaults.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = JsonStore::new(path);
        let config = store.load_or_default();
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Writes every adjustment, bumps the version once and persists.
    ///
    /// Returns the new version. An empty batch changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::ConfigWrite`] if the file cannot be written;
    /// the in-memory config is then unchanged.
    pub fn apply(&mut self, adjustments: &[Adjustment], now: DateTime<Utc>) -> Result<u64> {
        if adjustments.is_empty() {
            return Ok(self.config.version);
        }

        let mut next = self.config.clone();
        for adjustment in adjustments {
            next.set(&adjustment.key, adjustment.value);
        }
        next.version += 1;
        next.last_updated = now;

        self.store.save(&next).map_err(OptimizerError::ConfigWrite)?;
        self.config = next;

        info!(
            version = self.config.version,
            changes = adjustments.len(),
            path = %self.store.path().display(),
            "Prediction config updated"
        );
        Ok(self.config.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsalpha_core::{ConfigKey, Direction};
    use tempfile::TempDir;

    fn adjustment(key: ConfigKey, value: f64) -> Adjustment {
        Adjustment { key, value }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = PredictionConfigStore::open(dir.path().join("prediction_config.json"));
        assert_eq!(store.config().version, 1);
    }

    #[test]
    fn batch_bumps_version_once_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prediction_config.json");
        let mut store = PredictionConfigStore::open(&path);

        let version = store
            .apply(
                &[
                    adjustment(ConfigKey::SignalWeight(Direction::Down), 0.5),
                    adjustment(ConfigKey::StockAdjustment("600519".into()), 1.3),
                ],
                Utc::now(),
            )
            .unwrap();

        assert_eq!(version, 2);
        let reloaded = PredictionConfigStore::open(&path);
        assert_eq!(reloaded.config().version, 2);
        assert!((reloaded.config().signal_weight(Direction::Down) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_batch_leaves_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prediction_config.json");
        let mut store = PredictionConfigStore::open(&path);

        assert_eq!(store.apply(&[], Utc::now()).unwrap(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn failed_write_keeps_previous_config() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("prediction_config.json");
        std::fs::create_dir(&path).unwrap();
        let mut store = PredictionConfigStore::open(&path);

        let result = store.apply(&[adjustment(ConfigKey::ThresholdBullish, 2.0)], Utc::now());

        assert!(matches!(result, Err(OptimizerError::ConfigWrite(_))));
        assert_eq!(store.config().version, 1);
        assert!((store.config().threshold() - 1.0).abs() < f64::EPSILON);
    }
}
