use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Operator-owned settings. Every field has a default so a missing
/// `config/Config.toml` still yields a runnable configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub market_data: MarketDataConfig,
    pub backtest: BacktestConfig,
    pub scheduler: SchedulerConfig,
}

/// Where report artifacts are read from and state files are written to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub reports_subdir: String,
    pub weekly_subdir: String,
    pub monthly_subdir: String,
    pub price_cache_file: String,
    pub weekly_results_file: String,
    pub monthly_results_file: String,
    pub hourly_results_file: String,
    pub summary_file: String,
    pub prediction_config_file: String,
    pub optimization_history_file: String,
    pub optimization_report_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            reports_subdir: "reports".to_string(),
            weekly_subdir: "weekly".to_string(),
            monthly_subdir: "monthly".to_string(),
            price_cache_file: "price_cache.json".to_string(),
            weekly_results_file: "weekly_backtest_results.json".to_string(),
            monthly_results_file: "monthly_backtest_results.json".to_string(),
            hourly_results_file: "hourly_backtest_results.json".to_string(),
            summary_file: "backtest_summary.json".to_string(),
            prediction_config_file: "prediction_config.json".to_string(),
            optimization_history_file: "optimization_history.json".to_string(),
            optimization_report_file: "optimization_report.json".to_string(),
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    #[must_use]
    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join(&self.reports_subdir)
    }

    #[must_use]
    pub fn weekly_dir(&self) -> PathBuf {
        self.data_dir.join(&self.weekly_subdir)
    }

    #[must_use]
    pub fn monthly_dir(&self) -> PathBuf {
        self.data_dir.join(&self.monthly_subdir)
    }
}

/// Price provider endpoints and the retry budget for calls to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    pub eastmoney_url: String,
    pub yahoo_url: String,
    pub timeout_secs: u64,
    pub requests_per_second: u32,
    pub retry_attempts: u32,
    pub retry_backoff_secs: u64,
    /// Indices used for event predictions, tried in order.
    pub benchmarks: Vec<String>,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            eastmoney_url: "https://push2his.eastmoney.com".to_string(),
            yahoo_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 10,
            requests_per_second: 5,
            retry_attempts: 3,
            retry_backoff_secs: 2,
            benchmarks: vec!["SH000001".to_string(), "SZ399001".to_string()],
        }
    }
}

/// Backtest windows, caps, and per-kind verification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub lookback_days: i64,
    /// Monthly artifacts are loaded over `lookback_days * monthly_lookback_multiplier`.
    pub monthly_lookback_multiplier: i64,
    /// Extra days past the horizon before a prediction may be verified.
    pub age_buffer_days: i64,
    pub weekly_keep: usize,
    pub monthly_stock_keep: usize,
    pub monthly_event_keep: usize,
    pub hourly_keep: usize,
    pub monthly_stock_threshold: f64,
    pub event_threshold: f64,
    pub hourly_threshold: f64,
    pub monthly_horizon_days: u32,
    pub event_horizon_days: u32,
    pub hourly_horizon_days: u32,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            monthly_lookback_multiplier: 2,
            age_buffer_days: 2,
            weekly_keep: 100,
            monthly_stock_keep: 50,
            monthly_event_keep: 50,
            hourly_keep: 100,
            monthly_stock_threshold: 2.0,
            event_threshold: 1.0,
            hourly_threshold: 0.5,
            monthly_horizon_days: 10,
            event_horizon_days: 3,
            hourly_horizon_days: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Six-field cron expression (seconds first).
    pub cron_schedule: String,
    pub lookback_days: i64,
    pub include_hourly: bool,
    pub auto_apply: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron_schedule: "0 30 2 * * *".to_string(),
            lookback_days: 30,
            include_hourly: false,
            auto_apply: true,
        }
    }
}
