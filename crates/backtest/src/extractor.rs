//! Report artifacts and the predictions they contain.
//!
//! Upstream producers emit loosely shaped JSON (weekly and monthly analyses)
//! and plain-text hourly reports. Decoding is deliberately lenient: a missing
//! or mistyped field falls back to a default, and only an entry without a
//! symbol is dropped. Extraction itself never fails.

use chrono::NaiveDate;
use newsalpha_core::{
    BacktestConfig, Direction, Instrument, Market, PredictionConfig, PredictionRecord, Source,
    Target,
};
use newsalpha_data::ArtifactFile;
use serde_json::Value;
use thiserror::Error;

/// Errors from reading an artifact file. The artifact is skipped.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object at the top level")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Weekly,
    Monthly,
    Hourly,
}

// =============================================================================
// Keyword rules
// =============================================================================

/// Ordered `(keywords, value)` table for classifying free text.
///
/// The first rule with any keyword contained in the (lowercased) text wins;
/// text matching no rule gets the fallback.
#[derive(Debug, Clone)]
pub struct KeywordRules<T> {
    rules: Vec<(Vec<String>, T)>,
    fallback: T,
}

impl<T: Copy> KeywordRules<T> {
    #[must_use]
    pub fn new(fallback: T) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    #[must_use]
    pub fn rule(mut self, keywords: &[&str], value: T) -> Self {
        self.rules
            .push((keywords.iter().map(|k| k.to_lowercase()).collect(), value));
        self
    }

    #[must_use]
    pub fn classify(&self, text: &str) -> T {
        let text = text.to_lowercase();
        self.rules
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map_or(self.fallback, |(_, value)| *value)
    }
}

impl KeywordRules<Direction> {
    /// Stock prediction vocabulary: up, down, else flat.
    #[must_use]
    pub fn stock_directions() -> Self {
        Self::new(Direction::Flat)
            .rule(&["看涨", "上涨", "买入", "增持", "bullish", "buy", "up"], Direction::Up)
            .rule(&["看跌", "下跌", "卖出", "减持", "bearish", "sell", "down"], Direction::Down)
    }

    /// Event impact vocabulary: bullish, bearish, else neutral.
    #[must_use]
    pub fn event_stances() -> Self {
        Self::new(Direction::Neutral)
            .rule(
                &["利好", "看涨", "上涨", "提振", "bullish", "positive"],
                Direction::Bullish,
            )
            .rule(
                &["利空", "看跌", "下跌", "承压", "bearish", "negative"],
                Direction::Bearish,
            )
    }
}

// =============================================================================
// Artifacts
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyStock {
    pub symbol: String,
    pub name: Option<String>,
    pub prediction: String,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub anchor_date: NaiveDate,
    pub stocks: Vec<WeeklyStock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockPick {
    pub symbol: String,
    pub name: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventEntry {
    pub event: String,
    pub date: Option<NaiveDate>,
    /// All text found under `impact`, joined.
    pub impact_text: String,
    pub expected_direction: Option<Direction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    pub anchor_date: NaiveDate,
    pub buy: Vec<StockPick>,
    pub sell: Vec<StockPick>,
    pub events: Vec<EventEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyReport {
    pub anchor_date: NaiveDate,
    pub sentiment_cn: Option<f64>,
    pub sentiment_us: Option<f64>,
    pub stocks: Vec<(String, Direction)>,
}

/// A decoded report, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportArtifact {
    Weekly(WeeklyReport),
    Monthly(MonthlyReport),
    Hourly(HourlyReport),
}

impl ReportArtifact {
    /// Reads and decodes an artifact file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or, for JSON kinds, not a
    /// JSON object.
    pub fn load(kind: ReportKind, file: &ArtifactFile) -> Result<Self, ArtifactError> {
        let text = file.read_to_string()?;
        let anchor = file.anchor_date();
        match kind {
            ReportKind::Weekly => Ok(Self::Weekly(WeeklyReport::from_json(anchor, &parse_object(&text)?))),
            ReportKind::Monthly => Ok(Self::Monthly(MonthlyReport::from_json(anchor, &parse_object(&text)?))),
            ReportKind::Hourly => Ok(Self::Hourly(HourlyReport::parse(anchor, &text))),
        }
    }

    #[must_use]
    pub fn anchor_date(&self) -> NaiveDate {
        match self {
            Self::Weekly(r) => r.anchor_date,
            Self::Monthly(r) => r.anchor_date,
            Self::Hourly(r) => r.anchor_date,
        }
    }
}

fn parse_object(text: &str) -> Result<Value, ArtifactError> {
    let value: Value = serde_json::from_str(text)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(ArtifactError::NotAnObject)
    }
}

impl WeeklyReport {
    /// `{ "stocks": [{symbol, name, prediction, confidence, reason}] }`
    #[must_use]
    pub fn from_json(anchor_date: NaiveDate, value: &Value) -> Self {
        let stocks = entries(value.get("stocks"))
            .filter(|entry| entry.is_object())
            .filter_map(|entry| {
                let symbol = symbol_of(entry)?;
                let prediction = ["prediction", "direction", "trend"]
                    .iter()
                    .find_map(|k| entry.get(*k).and_then(Value::as_str))
                    .unwrap_or_default()
                    .to_string();
                Some(WeeklyStock {
                    symbol,
                    name: string_of(entry.get("name")),
                    prediction,
                    confidence: entry.get("confidence").and_then(confidence_of),
                })
            })
            .collect();

        Self { anchor_date, stocks }
    }
}

impl MonthlyReport {
    /// `{ "stock_recommendations": {"buy": [...], "sell": [...]}, "event_analysis": [...] }`
    #[must_use]
    pub fn from_json(anchor_date: NaiveDate, value: &Value) -> Self {
        let recommendations = value.get("stock_recommendations");
        let picks = |side: &str| -> Vec<StockPick> {
            entries(recommendations.and_then(|r| r.get(side)))
                .filter_map(|entry| {
                    Some(StockPick {
                        symbol: symbol_of(entry)?,
                        name: string_of(entry.get("name")),
                        confidence: entry.get("confidence").and_then(confidence_of),
                    })
                })
                .collect()
        };

        let events = entries(value.get("event_analysis"))
            .filter_map(|entry| {
                let event = string_of(entry.get("event"))?;
                let mut impact_text = String::new();
                if let Some(impact) = entry.get("impact") {
                    collect_text(impact, &mut impact_text);
                }
                Some(EventEntry {
                    event,
                    date: entry
                        .get("date")
                        .and_then(Value::as_str)
                        .and_then(parse_date),
                    impact_text,
                    expected_direction: entry
                        .get("expected_direction")
                        .and_then(Value::as_str)
                        .and_then(|s| s.parse::<Direction>().ok()),
                })
            })
            .collect();

        Self {
            anchor_date,
            buy: picks("buy"),
            sell: picks("sell"),
            events,
        }
    }
}

impl HourlyReport {
    /// Parses the text report.
    ///
    /// Recognized lines:
    /// - `中国市场 ... (指数: 0.35)` and `美国市场 ... (指数: -0.4)`
    /// - `股票影响: AAPL(苹果)↑ | 600519(贵州茅台)↓`
    #[must_use]
    pub fn parse(anchor_date: NaiveDate, text: &str) -> Self {
        let mut report = Self {
            anchor_date,
            sentiment_cn: None,
            sentiment_us: None,
            stocks: Vec::new(),
        };

        for raw in text.lines() {
            let line = raw.replace('：', ":").replace('（', "(").replace('）', ")");

            if line.contains("中国市场") {
                if let Some(score) = sentiment_score(&line) {
                    report.sentiment_cn = Some(score);
                }
            }
            if line.contains("美国市场") {
                if let Some(score) = sentiment_score(&line) {
                    report.sentiment_us = Some(score);
                }
            }
            if let Some((_, impacts)) = line.split_once("股票影响:") {
                report.stocks.extend(impacts.split('|').filter_map(parse_stock_impact));
            }
        }
        report
    }
}

fn sentiment_score(line: &str) -> Option<f64> {
    let (_, rest) = line.split_once("指数:")?;
    rest.split(')').next()?.trim().parse().ok()
}

fn parse_stock_impact(item: &str) -> Option<(String, Direction)> {
    let item = item.trim();
    if !(item.contains('(') && item.contains(')')) {
        return None;
    }
    let symbol = item.split('(').next()?.trim();
    if symbol.is_empty() {
        return None;
    }
    let direction = if item.contains('↑') {
        Direction::Up
    } else if item.contains('↓') {
        Direction::Down
    } else {
        Direction::Flat
    };
    Some((symbol.to_string(), direction))
}

// =============================================================================
// Lenient field decoding
// =============================================================================

fn entries(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn string_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Symbol from an object's `symbol`/`code` field, or from a bare string
/// such as `"贵州茅台(600519)"`.
fn symbol_of(entry: &Value) -> Option<String> {
    if let Value::String(s) = entry {
        return symbol_from_text(s);
    }
    string_of(entry.get("symbol")).or_else(|| string_of(entry.get("code")))
}

fn symbol_from_text(text: &str) -> Option<String> {
    let text = text.trim();
    if let (Some(open), Some(close)) = (text.find('('), text.rfind(')')) {
        if open < close {
            let inside = text[open + 1..close].trim();
            if Instrument::parse(inside).market != Market::Unknown {
                return Some(inside.to_string());
            }
            let before = text[..open].trim();
            return (!before.is_empty()).then(|| before.to_string());
        }
    }
    (!text.is_empty()).then(|| text.to_string())
}

/// Values from 1.5 up, or whole numbers above 1, are read as percentages.
/// Everything else is clamped into `[0, 1]`.
fn unit_confidence(v: f64) -> Option<f64> {
    if !v.is_finite() {
        return None;
    }
    let v = if v > 1.0 && (v >= 1.5 || v.fract() == 0.0) { v / 100.0 } else { v };
    Some(v.clamp(0.0, 1.0))
}

/// A number, a numeric or percentage string, or a 高/中/低 label.
fn confidence_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(unit_confidence),
        Value::String(s) => {
            let s = s.trim();
            match s.to_lowercase().as_str() {
                "高" | "high" => return Some(0.8),
                "中" | "medium" => return Some(0.5),
                "低" | "low" => return Some(0.3),
                _ => {}
            }
            if let Some(pct) = s.strip_suffix('%') {
                return pct
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| (v / 100.0).clamp(0.0, 1.0));
            }
            s.parse::<f64>().ok().and_then(unit_confidence)
        }
        _ => None,
    }
}

fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            out.push_str(s);
            out.push(' ');
        }
        Value::Array(items) => items.iter().for_each(|v| collect_text(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_text(v, out)),
        _ => {}
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

// =============================================================================
// Extractor
// =============================================================================

/// Horizon in days per prediction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizons {
    pub weekly: u32,
    pub monthly: u32,
    pub event: u32,
    pub hourly: u32,
}

impl Default for Horizons {
    fn default() -> Self {
        Self {
            weekly: Source::WeeklyAnalysis.default_horizon_days(),
            monthly: Source::MonthlyBuy.default_horizon_days(),
            event: Source::MonthlyEvent.default_horizon_days(),
            hourly: Source::News.default_horizon_days(),
        }
    }
}

/// Sentiment scores beyond this magnitude are directional.
const SENTIMENT_CUTOFF: f64 = 0.2;
const CN_INDEX: &str = "SH000001";
const US_INDEX: &str = "DJI";

/// Turns report artifacts into uniform prediction records.
#[derive(Debug, Clone)]
pub struct PredictionExtractor {
    direction_rules: KeywordRules<Direction>,
    stance_rules: KeywordRules<Direction>,
    horizons: Horizons,
}

impl Default for PredictionExtractor {
    fn default() -> Self {
        Self {
            direction_rules: KeywordRules::stock_directions(),
            stance_rules: KeywordRules::event_stances(),
            horizons: Horizons::default(),
        }
    }
}

impl PredictionExtractor {
    /// Weekly horizon follows `thresholds.verify_days`; the rest follow the
    /// backtest settings.
    #[must_use]
    pub fn from_config(backtest: &BacktestConfig, prediction: &PredictionConfig) -> Self {
        Self::default().with_horizons(Horizons {
            weekly: prediction.thresholds.verify_days,
            monthly: backtest.monthly_horizon_days,
            event: backtest.event_horizon_days,
            hourly: backtest.hourly_horizon_days,
        })
    }

    #[must_use]
    pub fn with_horizons(mut self, horizons: Horizons) -> Self {
        self.horizons = horizons;
        self
    }

    #[must_use]
    pub fn with_direction_rules(mut self, rules: KeywordRules<Direction>) -> Self {
        self.direction_rules = rules;
        self
    }

    #[must_use]
    pub fn with_stance_rules(mut self, rules: KeywordRules<Direction>) -> Self {
        self.stance_rules = rules;
        self
    }

    #[must_use]
    pub fn extract(&self, artifact: &ReportArtifact) -> Vec<PredictionRecord> {
        match artifact {
            ReportArtifact::Weekly(report) => self.extract_weekly(report),
            ReportArtifact::Monthly(report) => self.extract_monthly(report),
            ReportArtifact::Hourly(report) => self.extract_hourly(report),
        }
    }

    fn extract_weekly(&self, report: &WeeklyReport) -> Vec<PredictionRecord> {
        report
            .stocks
            .iter()
            .map(|stock| {
                let direction = stock
                    .prediction
                    .parse::<Direction>()
                    .map(Direction::polarity)
                    .unwrap_or_else(|_| self.direction_rules.classify(&stock.prediction));
                let mut record = PredictionRecord::new(
                    Target::symbol(&stock.symbol),
                    report.anchor_date,
                    direction,
                    Source::WeeklyAnalysis,
                )
                .with_horizon(self.horizons.weekly);
                if let Some(confidence) = stock.confidence {
                    record = record.with_confidence(confidence);
                }
                if let Some(name) = &stock.name {
                    record = record.with_name(name);
                }
                record
            })
            .collect()
    }

    fn extract_monthly(&self, report: &MonthlyReport) -> Vec<PredictionRecord> {
        let picks = |list: &[StockPick], direction: Direction, source: Source| {
            list.iter()
                .map(|pick| {
                    let mut record = PredictionRecord::new(
                        Target::symbol(&pick.symbol),
                        report.anchor_date,
                        direction,
                        source,
                    )
                    .with_horizon(self.horizons.monthly);
                    if let Some(confidence) = pick.confidence {
                        record = record.with_confidence(confidence);
                    }
                    if let Some(name) = &pick.name {
                        record = record.with_name(name);
                    }
                    record
                })
                .collect::<Vec<_>>()
        };

        let mut records = picks(&report.buy, Direction::Up, Source::MonthlyBuy);
        records.extend(picks(&report.sell, Direction::Down, Source::MonthlySell));
        records.extend(report.events.iter().map(|event| {
            let stance = event
                .expected_direction
                .map_or_else(|| self.stance_rules.classify(&event.impact_text), Direction::as_stance);
            PredictionRecord::new(
                Target::event(&event.event),
                event.date.unwrap_or(report.anchor_date),
                stance,
                Source::MonthlyEvent,
            )
            .with_horizon(self.horizons.event)
        }));
        records
    }

    fn extract_hourly(&self, report: &HourlyReport) -> Vec<PredictionRecord> {
        let sentiment = |symbol: &str, score: f64| {
            let direction = if score > SENTIMENT_CUTOFF {
                Direction::Up
            } else if score < -SENTIMENT_CUTOFF {
                Direction::Down
            } else {
                Direction::Flat
            };
            PredictionRecord::new(Target::symbol(symbol), report.anchor_date, direction, Source::Sentiment)
                .with_confidence(score.abs())
                .with_horizon(self.horizons.hourly)
        };

        let mut records = Vec::new();
        if let Some(score) = report.sentiment_cn {
            records.push(sentiment(CN_INDEX, score));
        }
        if let Some(score) = report.sentiment_us {
            records.push(sentiment(US_INDEX, score));
        }
        records.extend(report.stocks.iter().map(|(symbol, direction)| {
            PredictionRecord::new(Target::symbol(symbol), report.anchor_date, *direction, Source::News)
                .with_horizon(self.horizons.hourly)
        }));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ============================================================
    // Keyword rules
    // ============================================================

    #[test]
    fn first_matching_rule_wins_and_fallback_applies() {
        let rules = KeywordRules::stock_directions();
        assert_eq!(rules.classify("短期看涨，建议买入"), Direction::Up);
        assert_eq!(rules.classify("预计下跌"), Direction::Down);
        assert_eq!(rules.classify("Strong BUY"), Direction::Up);
        assert_eq!(rules.classify("trending up"), Direction::Up);
        assert_eq!(rules.classify("Likely DOWN this week"), Direction::Down);
        assert_eq!(rules.classify("区间整理"), Direction::Flat);
        assert_eq!(rules.classify(""), Direction::Flat);
    }

    #[test]
    fn custom_rules_are_injectable() {
        let rules = KeywordRules::new(0u8).rule(&["alpha"], 1).rule(&["beta"], 2);
        assert_eq!(rules.classify("ALPHA and beta"), 1);
        assert_eq!(rules.classify("only beta"), 2);
        assert_eq!(rules.classify("gamma"), 0);
    }

    // ============================================================
    // Weekly
    // ============================================================

    #[test]
    fn weekly_entries_become_records_and_symbolless_entries_are_skipped() {
        let value = json!({
            "stocks": [
                {"symbol": "AAA", "name": "Alpha", "prediction": "看涨", "confidence": 0.6},
                {"symbol": "600519", "prediction": "可能下跌", "confidence": "高"},
                {"name": "No Symbol", "prediction": "看涨"},
                {"symbol": "BBB"},
                "not an object"
            ]
        });
        let report = ReportArtifact::Weekly(WeeklyReport::from_json(date(2025, 1, 1), &value));
        let records = PredictionExtractor::default().extract(&report);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].symbol(), Some("AAA"));
        assert_eq!(records[0].predicted_direction, Direction::Up);
        assert!((records[0].confidence - 0.6).abs() < f64::EPSILON);
        assert_eq!(records[0].horizon_days, 5);
        assert_eq!(records[0].name.as_deref(), Some("Alpha"));
        assert_eq!(records[1].predicted_direction, Direction::Down);
        assert!((records[1].confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(records[2].predicted_direction, Direction::Flat);
        assert!((records[2].confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn weekly_horizon_follows_verify_days() {
        let mut prediction = PredictionConfig::default();
        prediction.thresholds.verify_days = 7;
        let extractor = PredictionExtractor::from_config(&BacktestConfig::default(), &prediction);

        let value = json!({"stocks": [{"symbol": "AAA", "prediction": "up"}]});
        let records = extractor.extract(&ReportArtifact::Weekly(WeeklyReport::from_json(date(2025, 1, 1), &value)));
        assert_eq!(records[0].horizon_days, 7);
    }

    #[test]
    fn missing_stocks_array_yields_nothing() {
        let report = WeeklyReport::from_json(date(2025, 1, 1), &json!({"summary": "quiet week"}));
        assert!(report.stocks.is_empty());
    }

    // ============================================================
    // Monthly
    // ============================================================

    #[test]
    fn monthly_buy_sell_and_events() {
        let value = json!({
            "stock_recommendations": {
                "buy": [{"symbol": "600519", "name": "贵州茅台"}, "宁德时代(300750)"],
                "sell": [{"code": "AAPL", "confidence": 80}],
                "hold": [{"symbol": "MSFT"}]
            },
            "event_analysis": [
                {"event": "降准", "date": "2025-02-10", "impact": {"stocks": "银行板块利好"}},
                {"event": "关税升级", "impact": {"stocks": ["出口承压"]}},
                {"event": "议息会议", "expected_direction": "up", "impact": {"stocks": "利空"}},
                {"event": "无影响说明"},
                {"impact": {"stocks": "利好"}}
            ]
        });
        let report = ReportArtifact::Monthly(MonthlyReport::from_json(date(2025, 2, 1), &value));
        let records = PredictionExtractor::default().extract(&report);

        assert_eq!(records.len(), 7);

        assert_eq!(records[0].source, Source::MonthlyBuy);
        assert_eq!(records[0].predicted_direction, Direction::Up);
        assert_eq!(records[0].horizon_days, 10);
        assert!((records[0].confidence - 0.7).abs() < f64::EPSILON);
        assert_eq!(records[1].symbol(), Some("300750"));

        assert_eq!(records[2].source, Source::MonthlySell);
        assert_eq!(records[2].predicted_direction, Direction::Down);
        assert!((records[2].confidence - 0.8).abs() < f64::EPSILON);

        let events = &records[3..];
        assert!(events.iter().all(PredictionRecord::is_event));
        assert_eq!(events[0].predicted_direction, Direction::Bullish);
        assert_eq!(events[0].anchor_date, date(2025, 2, 10));
        assert_eq!(events[0].horizon_days, 3);
        assert_eq!(events[1].predicted_direction, Direction::Bearish);
        assert_eq!(events[1].anchor_date, date(2025, 2, 1));
        assert_eq!(events[2].predicted_direction, Direction::Bullish);
        assert_eq!(events[3].predicted_direction, Direction::Neutral);
    }

    // ============================================================
    // Hourly
    // ============================================================

    #[test]
    fn hourly_text_yields_sentiment_and_news_predictions() {
        let text = "\
整体情绪: 偏多 (指数: 0.3)
中国市场: 偏多 (指数: 0.35)
美国市场：偏空（指数：-0.1）
股票影响: AAPL(苹果)↑ | 600519(贵州茅台)↓ | TSLA(特斯拉) | 无括号↑
";
        let report = HourlyReport::parse(date(2025, 1, 6), text);
        assert_eq!(report.sentiment_cn, Some(0.35));
        assert_eq!(report.sentiment_us, Some(-0.1));

        let records = PredictionExtractor::default().extract(&ReportArtifact::Hourly(report));
        assert_eq!(records.len(), 5);

        assert_eq!(records[0].symbol(), Some("SH000001"));
        assert_eq!(records[0].predicted_direction, Direction::Up);
        assert!((records[0].confidence - 0.35).abs() < 1e-9);
        assert_eq!(records[0].source, Source::Sentiment);

        assert_eq!(records[1].symbol(), Some("DJI"));
        assert_eq!(records[1].predicted_direction, Direction::Flat);

        assert_eq!(records[2].symbol(), Some("AAPL"));
        assert_eq!(records[2].predicted_direction, Direction::Up);
        assert_eq!(records[2].source, Source::News);
        assert!((records[2].confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(records[3].predicted_direction, Direction::Down);
        assert_eq!(records[4].predicted_direction, Direction::Flat);
        assert_eq!(records[4].horizon_days, 1);
    }

    #[test]
    fn hourly_without_recognized_lines_is_empty() {
        let report = HourlyReport::parse(date(2025, 1, 6), "nothing to see here");
        assert!(PredictionExtractor::default()
            .extract(&ReportArtifact::Hourly(report))
            .is_empty());
    }

    // ============================================================
    // Field decoding
    // ============================================================

    #[test]
    fn confidence_accepts_numbers_percentages_and_labels() {
        assert_eq!(confidence_of(&json!(0.4)), Some(0.4));
        assert_eq!(confidence_of(&json!(75)), Some(0.75));
        assert_eq!(confidence_of(&json!("60%")), Some(0.6));
        assert_eq!(confidence_of(&json!("低")), Some(0.3));
        assert_eq!(confidence_of(&json!("unsure")), None);
        assert_eq!(confidence_of(&json!(null)), None);
    }

    #[test]
    fn confidence_slightly_above_one_is_clamped() {
        assert_eq!(confidence_of(&json!(1.2)), Some(1.0));
        assert_eq!(confidence_of(&json!("1.4")), Some(1.0));
        assert_eq!(confidence_of(&json!(2)), Some(0.02));
        assert_eq!(confidence_of(&json!(1.5)), Some(0.015));
        assert_eq!(confidence_of(&json!(-0.2)), Some(0.0));
        assert_eq!(confidence_of(&json!("150%")), Some(1.0));
    }

    #[test]
    fn symbol_from_text_prefers_code_in_parentheses() {
        assert_eq!(symbol_from_text("贵州茅台(600519)").as_deref(), Some("600519"));
        assert_eq!(symbol_from_text("AAPL(苹果)").as_deref(), Some("AAPL"));
        assert_eq!(symbol_from_text(" MSFT ").as_deref(), Some("MSFT"));
        assert_eq!(symbol_from_text("  "), None);
    }
}
