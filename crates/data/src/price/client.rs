//! HTTP price source.
//!
//! Mainland and Hong Kong instruments are served by the Eastmoney kline
//! endpoint; US tickers by the Yahoo chart endpoint. All requests share one
//! rate limiter and the same bounded retry policy.

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate};
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use newsalpha_core::{Instrument, Market, MarketDataConfig};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{PriceBar, PriceError, PriceSource};
use crate::retry::RetryPolicy;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; newsalpha/0.1)";

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct KlineResponse {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// =============================================================================
// Client
// =============================================================================

pub struct MarketDataClient {
    http_client: Client,
    eastmoney_url: String,
    yahoo_url: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
    retry: RetryPolicy,
}

impl MarketDataClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &MarketDataConfig) -> Result<Self, PriceError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http_client,
            eastmoney_url: config.eastmoney_url.trim_end_matches('/').to_string(),
            yahoo_url: config.yahoo_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
            retry: RetryPolicy::new(
                config.retry_attempts,
                Duration::from_secs(config.retry_backoff_secs),
            ),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, PriceError> {
        self.retry
            .run(url, move || async move {
                self.rate_limiter.until_ready().await;
                let response = self.http_client.get(url).query(query).send().await?;
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(PriceError::RateLimit);
                }
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(PriceError::Api {
                        status_code: status.as_u16(),
                        message,
                    });
                }
                Ok(response.json::<T>().await?)
            })
            .await
    }

    async fn eastmoney_bars(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceError> {
        let market_id = match instrument.market {
            Market::Sh => "1",
            Market::Sz | Market::Bj => "0",
            Market::Hk => "116",
            Market::Us | Market::Unknown => {
                return Err(PriceError::UnsupportedMarket(instrument.code.clone()))
            }
        };
        let url = format!("{}/api/qt/stock/kline/get", self.eastmoney_url);
        let query = [
            ("secid", format!("{market_id}.{}", instrument.code)),
            ("fields1", "f1,f2,f3,f4,f5,f6".to_string()),
            ("fields2", "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61".to_string()),
            ("klt", "101".to_string()),
            ("fqt", "1".to_string()),
            ("beg", start.format("%Y%m%d").to_string()),
            ("end", end.format("%Y%m%d").to_string()),
        ];

        let response: KlineResponse = self.get_json(&url, &query).await?;
        let klines = response.data.map(|d| d.klines).unwrap_or_default();
        klines.iter().map(String::as_str).map(parse_kline).collect()
    }

    async fn yahoo_bars(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceError> {
        let symbol = yahoo_symbol(&instrument.code);
        let url = format!("{}/v8/finance/chart/{symbol}", self.yahoo_url);
        let period_end = end.checked_add_days(Days::new(1)).unwrap_or(end);
        let query = [
            ("period1", unix_midnight(start).to_string()),
            ("period2", unix_midnight(period_end).to_string()),
            ("interval", "1d".to_string()),
        ];

        let response: ChartResponse = self.get_json(&url, &query).await?;
        let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };
        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        Ok(result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
                close.map(|c| PriceBar::new(date, c))
            })
            .collect())
    }
}

#[async_trait]
impl PriceSource for MarketDataClient {
    async fn daily_bars(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceError> {
        let mut bars = match instrument.market {
            Market::Us => self.yahoo_bars(instrument, start, end).await?,
            _ => self.eastmoney_bars(instrument, start, end).await?,
        };
        bars.retain(|b| b.date >= start && b.date <= end);
        bars.sort_by_key(|b| b.date);

        debug!(
            instrument = %instrument.key(),
            start = %start,
            end = %end,
            bars = bars.len(),
            "Fetched daily bars"
        );
        Ok(bars)
    }

    fn name(&self) -> &str {
        "market-data-http"
    }
}

/// `date,open,close,high,low,volume,amount,amplitude,change_pct,...`
fn parse_kline(line: &str) -> Result<PriceBar, PriceError> {
    let fields: Vec<&str> = line.split(',').collect();
    let bad = || PriceError::Parse(format!("malformed kline '{line}'"));

    let date = fields
        .first()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(bad)?;
    let close = fields
        .get(2)
        .and_then(|c| c.parse::<f64>().ok())
        .ok_or_else(bad)?;
    let change_pct = fields.get(8).and_then(|c| c.parse::<f64>().ok());

    Ok(PriceBar {
        date,
        close,
        change_pct,
    })
}

/// Index aliases used in reports, mapped onto Yahoo's caret symbols.
fn yahoo_symbol(code: &str) -> String {
    match code {
        "DJI" => "^DJI".to_string(),
        "SPX" | "GSPC" => "^GSPC".to_string(),
        "IXIC" => "^IXIC".to_string(),
        "NDX" => "^NDX".to_string(),
        other => other.to_string(),
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map_or(0, |dt| dt.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn client_for(server: &MockServer) -> MarketDataClient {
        let config = MarketDataConfig {
            eastmoney_url: server.uri(),
            yahoo_url: server.uri(),
            timeout_secs: 5,
            requests_per_second: 100,
            retry_attempts: 3,
            retry_backoff_secs: 0,
            ..MarketDataConfig::default()
        };
        MarketDataClient::new(&config).unwrap()
    }

    // ==================== Parsing ====================

    #[test]
    fn parses_kline_close_and_change() {
        let bar = parse_kline("2025-01-02,10.00,10.50,10.60,9.90,1000,10500,7.0,5.00,0.50,1.2").unwrap();
        assert_eq!(bar.date, date(2025, 1, 2));
        assert!((bar.close - 10.5).abs() < f64::EPSILON);
        assert_eq!(bar.change_pct, Some(5.0));
        assert!(parse_kline("garbage").is_err());
    }

    #[test]
    fn index_aliases_map_to_yahoo_symbols() {
        assert_eq!(yahoo_symbol("DJI"), "^DJI");
        assert_eq!(yahoo_symbol("AAPL"), "AAPL");
    }

    // ==================== Mock server ====================

    #[tokio::test]
    async fn fetches_eastmoney_bars_for_shanghai_symbol() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/qt/stock/kline/get"))
            .and(query_param("secid", "1.600519"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rc": 0,
                "data": {
                    "code": "600519",
                    "klines": [
                        "2025-01-03,1500,1515,1520,1490,100,0,0,1.00,15,0.1",
                        "2025-01-02,1490,1500,1505,1480,100,0,0,-0.50,-7.5,0.1"
                    ]
                }
            })))
            .mount(&server)
            .await;

        let bars = client_for(&server)
            .daily_bars(&Instrument::parse("600519"), date(2025, 1, 1), date(2025, 1, 10))
            .await
            .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date(2025, 1, 2));
        assert!((bars[1].close - 1515.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn null_data_means_no_bars() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/qt/stock/kline/get"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"rc": 0, "data": null})),
            )
            .mount(&server)
            .await;

        let bars = client_for(&server)
            .daily_bars(&Instrument::parse("SZ399001"), date(2025, 1, 1), date(2025, 1, 10))
            .await
            .unwrap();
        assert!(bars.is_empty());
    }

    #[tokio::test]
    async fn fetches_yahoo_bars_and_skips_null_closes() {
        let server = MockServer::start().await;
        // 2025-01-02 and 2025-01-03, 14:30 UTC
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chart": {
                    "result": [{
                        "timestamp": [1735828200, 1735914600, 1736173800],
                        "indicators": {"quote": [{"close": [243.85, null, 245.0]}]}
                    }],
                    "error": null
                }
            })))
            .mount(&server)
            .await;

        let bars = client_for(&server)
            .daily_bars(&Instrument::parse("AAPL"), date(2025, 1, 1), date(2025, 1, 10))
            .await
            .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date(2025, 1, 2));
        assert_eq!(bars[1].date, date(2025, 1, 6));
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/qt/stock/kline/get"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/qt/stock/kline/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"klines": ["2025-01-02,1,2,2,1,0,0,0,0,0,0"]}
            })))
            .mount(&server)
            .await;

        let bars = client_for(&server)
            .daily_bars(&Instrument::parse("000001"), date(2025, 1, 1), date(2025, 1, 10))
            .await
            .unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/qt/stock/kline/get"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .daily_bars(&Instrument::parse("600000"), date(2025, 1, 1), date(2025, 1, 10))
            .await;
        assert!(matches!(result, Err(PriceError::Api { status_code: 404, .. })));
    }

    #[tokio::test]
    async fn unknown_market_is_unsupported() {
        let server = MockServer::start().await;
        let result = client_for(&server)
            .daily_bars(&Instrument::parse("BRK.B"), date(2025, 1, 1), date(2025, 1, 10))
            .await;
        assert!(matches!(result, Err(PriceError::UnsupportedMarket(_))));
    }
}
