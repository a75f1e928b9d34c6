//! Versioned prediction-weighting configuration.
//!
//! Written only by the optimizer and read by anything that turns a raw
//! prediction into a tradable decision. A saved document missing any
//! top-level section picks that section up from the defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::prediction::{Direction, Source};

/// Percentage cutoffs used to classify a realized move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// A move above this is `up`.
    pub bullish: f64,
    /// A move below this is `down`. Kept as `-bullish`.
    pub bearish: f64,
    /// Horizon in days for weekly-analysis verification.
    #[serde(default = "default_verify_days")]
    pub verify_days: u32,
}

const fn default_verify_days() -> u32 {
    5
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::symmetric(1.0)
    }
}

impl Thresholds {
    #[must_use]
    pub const fn symmetric(threshold: f64) -> Self {
        Self {
            bullish: threshold,
            bearish: -threshold,
            verify_days: default_verify_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub thresholds: Thresholds,
    /// Confidence multiplier per predicted direction.
    pub signal_weights: BTreeMap<String, f64>,
    /// Confidence multiplier per provenance source.
    pub source_reliability: BTreeMap<String, f64>,
    /// Confidence multiplier per symbol, learned from per-symbol accuracy.
    pub stock_adjustments: BTreeMap<String, f64>,
    pub time_adjustments: BTreeMap<String, f64>,
    pub market_regime: BTreeMap<String, f64>,
    /// Adjusted confidence below this is not traded.
    pub min_confidence: f64,
    /// Bumped once per applied optimization batch.
    pub version: u64,
    pub last_updated: DateTime<Utc>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        let weights = |pairs: &[(&str, f64)]| {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            thresholds: Thresholds::default(),
            signal_weights: weights(&[("up", 1.0), ("down", 1.0), ("flat", 1.0)]),
            source_reliability: weights(&[
                ("weekly_analysis", 1.0),
                ("monthly_buy", 1.0),
                ("monthly_sell", 1.0),
                ("monthly_event", 1.0),
                ("sentiment", 0.8),
                ("news", 0.7),
            ]),
            stock_adjustments: BTreeMap::new(),
            time_adjustments: weights(&[("monday", 1.0), ("friday", 1.0)]),
            market_regime: weights(&[("high_volatility", 0.8), ("low_volatility", 1.2)]),
            min_confidence: 0.3,
            version: 1,
            last_updated: Utc::now(),
        }
    }
}

impl PredictionConfig {
    /// Symmetric classification threshold in percent.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.thresholds.bullish
    }

    #[must_use]
    pub fn signal_weight(&self, direction: Direction) -> f64 {
        self.signal_weights.get(direction.as_str()).copied().unwrap_or(1.0)
    }

    #[must_use]
    pub fn source_weight(&self, source: Source) -> f64 {
        self.source_reliability.get(source.as_str()).copied().unwrap_or(1.0)
    }

    #[must_use]
    pub fn stock_weight(&self, symbol: &str) -> f64 {
        self.stock_adjustments.get(symbol).copied().unwrap_or(1.0)
    }

    /// Reads the value a key addresses, if set.
    #[must_use]
    pub fn get(&self, key: &ConfigKey) -> Option<f64> {
        match key {
            ConfigKey::SignalWeight(d) => self.signal_weights.get(d.as_str()).copied(),
            ConfigKey::ThresholdBullish => Some(self.thresholds.bullish),
            ConfigKey::ThresholdBearish => Some(self.thresholds.bearish),
            ConfigKey::SourceReliability(s) => self.source_reliability.get(s).copied(),
            ConfigKey::StockAdjustment(s) => self.stock_adjustments.get(s).copied(),
        }
    }

    /// Writes a value at the addressed key. Does not touch `version`.
    pub fn set(&mut self, key: &ConfigKey, value: f64) {
        match key {
            ConfigKey::SignalWeight(d) => {
                self.signal_weights.insert(d.as_str().to_string(), value);
            }
            ConfigKey::ThresholdBullish => self.thresholds.bullish = value,
            ConfigKey::ThresholdBearish => self.thresholds.bearish = value,
            ConfigKey::SourceReliability(s) => {
                self.source_reliability.insert(s.clone(), value);
            }
            ConfigKey::StockAdjustment(s) => {
                self.stock_adjustments.insert(s.clone(), value);
            }
        }
    }
}

/// Address of one tunable value, rendered as `section.param`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ConfigKey {
    SignalWeight(Direction),
    ThresholdBullish,
    ThresholdBearish,
    SourceReliability(String),
    StockAdjustment(String),
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignalWeight(d) => write!(f, "signal_weights.{d}"),
            Self::ThresholdBullish => f.write_str("thresholds.bullish"),
            Self::ThresholdBearish => f.write_str("thresholds.bearish"),
            Self::SourceReliability(s) => write!(f, "source_reliability.{s}"),
            Self::StockAdjustment(s) => write!(f, "stock_adjustments.{s}"),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, param) = s
            .split_once('.')
            .ok_or_else(|| format!("config key '{s}' is not section.param"))?;

        match section {
            "signal_weights" => param.parse().map(Self::SignalWeight),
            "thresholds" if param == "bullish" => Ok(Self::ThresholdBullish),
            "thresholds" if param == "bearish" => Ok(Self::ThresholdBearish),
            "source_reliability" => Ok(Self::SourceReliability(param.to_string())),
            "stock_adjustments" => Ok(Self::StockAdjustment(param.to_string())),
            _ => Err(format!("unknown config key '{s}'")),
        }
    }
}

impl From<ConfigKey> for String {
    fn from(key: ConfigKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for ConfigKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
