//! Daily price series and the realized change they imply.
//!
//! - [`PriceSource`]: where daily bars come from (HTTP in production)
//! - [`PriceCache`]: persistent memoization of fetched series
//! - [`PriceOutcomeResolver`]: turns a prediction target into a realized move

mod cache;
mod client;
mod error;
mod resolver;

pub use cache::PriceCache;
pub use client::MarketDataClient;
pub use error::PriceError;
pub use resolver::{compound_change, PriceOutcomeResolver, ResolvedChange};

use async_trait::async_trait;
use chrono::NaiveDate;
use newsalpha_core::Instrument;
use serde::{Deserialize, Serialize};

/// One daily close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
    /// Provider-reported daily change in percent, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
}

impl PriceBar {
    #[must_use]
    pub const fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            change_pct: None,
        }
    }
}

/// A provider of daily bars.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Returns bars with `start <= date <= end`, in any order.
    ///
    /// An empty vector means the provider has no data for the window.
    async fn daily_bars(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceError>;

    /// Returns the source name for logging.
    fn name(&self) -> &str;
}
