//! Prediction records and the vocabulary they are expressed in.
//!
//! A [`PredictionRecord`] is created once from a report artifact and never
//! mutated afterwards. Verification produces a separate
//! [`VerifiedPrediction`] that embeds the original record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Qualitative price movement, either predicted or realized.
///
/// Stock predictions use `Up`/`Down`/`Flat`; event predictions use the
/// `Bullish`/`Bearish`/`Neutral` stances. Both map onto the same polarity
/// when compared against a realized move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "上涨")]
    Up,
    #[serde(alias = "下跌")]
    Down,
    #[serde(alias = "震荡", alias = "sideways")]
    Flat,
    Bullish,
    Bearish,
    #[serde(alias = "中性")]
    Neutral,
}

impl Direction {
    /// Returns the stock-style direction this value compares against.
    #[must_use]
    pub const fn polarity(self) -> Self {
        match self {
            Self::Up | Self::Bullish => Self::Up,
            Self::Down | Self::Bearish => Self::Down,
            Self::Flat | Self::Neutral => Self::Flat,
        }
    }

    /// Returns the event stance with the same polarity.
    #[must_use]
    pub const fn as_stance(self) -> Self {
        match self.polarity() {
            Self::Up => Self::Bullish,
            Self::Down => Self::Bearish,
            _ => Self::Neutral,
        }
    }

    /// True for the event-only variants.
    #[must_use]
    pub const fn is_stance(self) -> bool {
        matches!(self, Self::Bullish | Self::Bearish | Self::Neutral)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Flat => "flat",
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "上涨" => Ok(Self::Up),
            "down" | "下跌" => Ok(Self::Down),
            "flat" | "sideways" | "震荡" => Ok(Self::Flat),
            "bullish" => Ok(Self::Bullish),
            "bearish" => Ok(Self::Bearish),
            "neutral" | "中性" => Ok(Self::Neutral),
            other => Err(format!(
                "unknown direction '{other}' (expected up, down, flat, bullish, bearish, neutral)"
            )),
        }
    }
}

/// Provenance of a prediction. Drives reliability weighting and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    WeeklyAnalysis,
    MonthlyBuy,
    MonthlySell,
    MonthlyEvent,
    Sentiment,
    News,
}

impl Source {
    pub const ALL: [Self; 6] = [
        Self::WeeklyAnalysis,
        Self::MonthlyBuy,
        Self::MonthlySell,
        Self::MonthlyEvent,
        Self::Sentiment,
        Self::News,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WeeklyAnalysis => "weekly_analysis",
            Self::MonthlyBuy => "monthly_buy",
            Self::MonthlySell => "monthly_sell",
            Self::MonthlyEvent => "monthly_event",
            Self::Sentiment => "sentiment",
            Self::News => "news",
        }
    }

    /// Days after the anchor date over which predictions from this source are judged.
    #[must_use]
    pub const fn default_horizon_days(self) -> u32 {
        match self {
            Self::WeeklyAnalysis => 5,
            Self::MonthlyBuy | Self::MonthlySell => 10,
            Self::MonthlyEvent => 3,
            Self::Sentiment | Self::News => 1,
        }
    }

    /// Confidence assumed when the artifact does not state one.
    #[must_use]
    pub const fn default_confidence(self) -> f64 {
        match self {
            Self::WeeklyAnalysis | Self::News => 0.5,
            Self::MonthlyBuy | Self::MonthlySell => 0.7,
            Self::MonthlyEvent => 0.6,
            Self::Sentiment => 0.0,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("unknown source '{s}'"))
    }
}

/// Exchange a symbol trades on, inferred from the symbol's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Sh,
    Sz,
    Bj,
    Hk,
    Us,
    Unknown,
}

impl Market {
    /// Identifies the market of a symbol.
    ///
    /// Bare six-digit codes are routed by their leading digit, `SH`/`SZ`/`BJ`
    /// prefixed codes keep their exchange, five digits are Hong Kong and
    /// purely alphabetic tickers are US.
    #[must_use]
    pub fn identify(symbol: &str) -> Self {
        Instrument::parse(symbol).market
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sh => "sh",
            Self::Sz => "sz",
            Self::Bj => "bj",
            Self::Hk => "hk",
            Self::Us => "us",
            Self::Unknown => "unknown",
        }
    }

    /// Coarse region used when grouping accuracy by market.
    #[must_use]
    pub const fn region(self) -> &'static str {
        match self {
            Self::Sh | Self::Sz | Self::Bj => "cn",
            Self::Hk => "hk",
            Self::Us => "us",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbol split into its market and the exchange-local code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instrument {
    pub market: Market,
    pub code: String,
}

impl Instrument {
    #[must_use]
    pub fn parse(symbol: &str) -> Self {
        let s = symbol.trim().to_uppercase();
        let all_digits = |v: &str| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit());

        for (prefix, market) in [("SH", Market::Sh), ("SZ", Market::Sz), ("BJ", Market::Bj)] {
            if let Some(rest) = s.strip_prefix(prefix) {
                if rest.len() == 6 && all_digits(rest) {
                    return Self { market, code: rest.to_string() };
                }
            }
        }

        let market = if s.len() == 6 && all_digits(&s) {
            match s.as_bytes()[0] {
                b'6' => Market::Sh,
                b'0' | b'3' => Market::Sz,
                b'4' | b'8' => Market::Bj,
                _ => Market::Unknown,
            }
        } else if s.len() == 5 && all_digits(&s) {
            Market::Hk
        } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase()) {
            Market::Us
        } else {
            Market::Unknown
        };

        Self { market, code: s }
    }

    /// Key fragment identifying this instrument, e.g. `sh_600519`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}_{}", self.market, self.code)
    }
}

/// What a prediction is about: a tradable symbol or a macro event.
///
/// Flattened into the record, so stock predictions serialize a `symbol`
/// field and event predictions an `event` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Symbol { symbol: String },
    Event { event: String },
}

impl Target {
    #[must_use]
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self::Symbol { symbol: symbol.into() }
    }

    #[must_use]
    pub fn event(event: impl Into<String>) -> Self {
        Self::Event { event: event.into() }
    }

    /// Display key: the symbol or the event name.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Symbol { symbol } => symbol,
            Self::Event { event } => event,
        }
    }
}

/// One directional forecast with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(flatten)]
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Date the prediction was made (the report's generation date).
    #[serde(alias = "date")]
    pub anchor_date: NaiveDate,
    pub predicted_direction: Direction,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub source: Source,
    pub horizon_days: u32,
}

impl PredictionRecord {
    /// Creates a record using the source's default confidence and horizon.
    #[must_use]
    pub fn new(target: Target, anchor_date: NaiveDate, direction: Direction, source: Source) -> Self {
        Self {
            target,
            name: None,
            anchor_date,
            predicted_direction: direction,
            confidence: source.default_confidence(),
            source,
            horizon_days: source.default_horizon_days(),
        }
    }

    /// Sets the confidence, clamped to `[0, 1]`. Non-finite values are ignored.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        if confidence.is_finite() {
            self.confidence = confidence.clamp(0.0, 1.0);
        }
        self
    }

    #[must_use]
    pub fn with_horizon(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The ticker, or `None` for event predictions.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        match &self.target {
            Target::Symbol { symbol } => Some(symbol),
            Target::Event { .. } => None,
        }
    }

    #[must_use]
    pub fn is_event(&self) -> bool {
        matches!(self.target, Target::Event { .. })
    }
}

/// A prediction together with the realized outcome it was judged against.
///
/// Only exists when price data was resolvable for the prediction's window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedPrediction {
    #[serde(flatten)]
    pub prediction: PredictionRecord,
    /// Symbol actually priced (the benchmark for event predictions).
    #[serde(default)]
    pub instrument: String,
    pub actual_change_pct: f64,
    pub actual_direction: Direction,
    /// Classification threshold in percent used for this verification.
    #[serde(default)]
    pub threshold: f64,
    pub is_correct: bool,
    pub verified_at: DateTime<Utc>,
}

impl VerifiedPrediction {
    /// Market of the priced instrument.
    #[must_use]
    pub fn market(&self) -> Market {
        Market::identify(&self.instrument)
    }

    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        self.prediction.symbol()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ============================================================
    // Direction
    // ============================================================

    #[test]
    fn stances_share_polarity_with_stock_directions() {
        assert_eq!(Direction::Bullish.polarity(), Direction::Up);
        assert_eq!(Direction::Bearish.polarity(), Direction::Down);
        assert_eq!(Direction::Neutral.polarity(), Direction::Flat);
        assert_eq!(Direction::Down.as_stance(), Direction::Bearish);
        assert!(Direction::Neutral.is_stance());
        assert!(!Direction::Flat.is_stance());
    }

    #[test]
    fn direction_accepts_chinese_labels() {
        let up: Direction = serde_json::from_str(r#""上涨""#).unwrap();
        let flat: Direction = serde_json::from_str(r#""震荡""#).unwrap();
        assert_eq!(up, Direction::Up);
        assert_eq!(flat, Direction::Flat);
        assert_eq!("下跌".parse::<Direction>().unwrap(), Direction::Down);
        assert!("sideways-ish".parse::<Direction>().is_err());
    }

    // ============================================================
    // Market identification
    // ============================================================

    #[test]
    fn identifies_markets_by_symbol_shape() {
        assert_eq!(Market::identify("600519"), Market::Sh);
        assert_eq!(Market::identify("000001"), Market::Sz);
        assert_eq!(Market::identify("300750"), Market::Sz);
        assert_eq!(Market::identify("830799"), Market::Bj);
        assert_eq!(Market::identify("00700"), Market::Hk);
        assert_eq!(Market::identify("aapl"), Market::Us);
        assert_eq!(Market::identify("SH000001"), Market::Sh);
        assert_eq!(Market::identify("BRK.B"), Market::Unknown);
        assert_eq!(Market::identify(""), Market::Unknown);
    }

    #[test]
    fn prefixed_index_keeps_exchange_and_strips_code() {
        let instrument = Instrument::parse("SZ399001");
        assert_eq!(instrument.market, Market::Sz);
        assert_eq!(instrument.code, "399001");
        assert_eq!(instrument.key(), "sz_399001");
        assert_eq!(Market::Sz.region(), "cn");
    }

    // ============================================================
    // Records
    // ============================================================

    #[test]
    fn new_record_uses_source_defaults() {
        let record = PredictionRecord::new(
            Target::symbol("AAA"),
            date(2025, 1, 1),
            Direction::Up,
            Source::MonthlyBuy,
        );
        assert_eq!(record.horizon_days, 10);
        assert!((record.confidence - 0.7).abs() < f64::EPSILON);
        assert_eq!(record.symbol(), Some("AAA"));
    }

    #[test]
    fn confidence_is_clamped_and_nan_ignored() {
        let base = PredictionRecord::new(
            Target::symbol("AAA"),
            date(2025, 1, 1),
            Direction::Up,
            Source::News,
        );
        assert!((base.clone().with_confidence(1.7).confidence - 1.0).abs() < f64::EPSILON);
        assert!((base.with_confidence(f64::NAN).confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn event_records_serialize_event_key_instead_of_symbol() {
        let record = PredictionRecord::new(
            Target::event("FOMC rate decision"),
            date(2025, 3, 19),
            Direction::Bearish,
            Source::MonthlyEvent,
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["event"], "FOMC rate decision");
        assert!(json.get("symbol").is_none());

        let back: PredictionRecord = serde_json::from_value(json).unwrap();
        assert!(back.is_event());
        assert_eq!(back.target.key(), "FOMC rate decision");
    }

    #[test]
    fn verified_prediction_reads_flat_json() {
        let json = serde_json::json!({
            "symbol": "AAA",
            "anchor_date": "2025-01-01",
            "predicted_direction": "up",
            "confidence": 0.6,
            "source": "weekly_analysis",
            "horizon_days": 5,
            "instrument": "AAA",
            "actual_change_pct": 3.0,
            "actual_direction": "up",
            "threshold": 1.0,
            "is_correct": true,
            "verified_at": "2025-01-10T00:00:00Z"
        });
        let verified: VerifiedPrediction = serde_json::from_value(json).unwrap();
        assert_eq!(verified.symbol(), Some("AAA"));
        assert_eq!(verified.market(), Market::Us);
        assert!(verified.is_correct);
    }
}
