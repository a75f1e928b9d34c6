use chrono::{Days, Local, NaiveDate};
use newsalpha_core::{Instrument, Target};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{PriceBar, PriceCache, PriceSource};

/// Fetch window starts this many days before the anchor.
const LEAD_DAYS: u64 = 10;
/// Extra calendar days past `2 * horizon` so weekends and holidays still
/// leave `horizon` trading days in the window.
const TAIL_DAYS: u64 = 7;

/// A realized move and the instrument it was measured on.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChange {
    pub change_pct: f64,
    /// The symbol priced; for event targets, the benchmark that resolved.
    pub instrument: String,
}

/// Resolves prediction targets to realized percentage moves.
///
/// Unresolvable targets (no data, provider errors, zero horizon, fewer than
/// `horizon` bars after the anchor) come back as `None` and never as an error.
/// A series is cached only once its fetch window has closed and it covers the
/// full horizon.
pub struct PriceOutcomeResolver {
    source: Arc<dyn PriceSource>,
    cache: PriceCache,
    benchmarks: Vec<String>,
    today: Option<NaiveDate>,
}

impl PriceOutcomeResolver {
    #[must_use]
    pub fn new(source: Arc<dyn PriceSource>, cache: PriceCache, benchmarks: Vec<String>) -> Self {
        Self {
            source,
            cache,
            benchmarks,
            today: None,
        }
    }

    /// Pins the date used to decide whether a fetch window has closed.
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = Some(today);
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    #[must_use]
    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Realized move for a prediction target over `horizon_days` trading days
    /// after `anchor`. Event targets are measured on the first benchmark that
    /// has data.
    pub async fn get_change(
        &mut self,
        target: &Target,
        anchor: NaiveDate,
        horizon_days: u32,
    ) -> Option<ResolvedChange> {
        match target {
            Target::Symbol { symbol } => self
                .change_for(symbol, anchor, horizon_days)
                .await
                .map(|change_pct| ResolvedChange {
                    change_pct,
                    instrument: symbol.clone(),
                }),
            Target::Event { event } => {
                for benchmark in self.benchmarks.clone() {
                    if let Some(change_pct) = self.change_for(&benchmark, anchor, horizon_days).await {
                        return Some(ResolvedChange {
                            change_pct,
                            instrument: benchmark,
                        });
                    }
                    debug!(event = %event, benchmark = %benchmark, "Benchmark unavailable, trying next");
                }
                None
            }
        }
    }

    /// Realized move for one symbol, in percent.
    pub async fn change_for(&mut self, symbol: &str, anchor: NaiveDate, horizon_days: u32) -> Option<f64> {
        if horizon_days == 0 {
            return None;
        }
        let instrument = Instrument::parse(symbol);
        let start = anchor.checked_sub_days(Days::new(LEAD_DAYS))?;
        let end = anchor.checked_add_days(Days::new(2 * u64::from(horizon_days) + TAIL_DAYS))?;
        let key = PriceCache::key(&instrument, start, end);

        if let Some(bars) = self.cache.get(&key) {
            if let Some(change) = compound_change(bars, anchor, horizon_days) {
                return Some(change);
            }
            debug!(symbol, key = %key, "Cached series is short of the horizon, refetching");
        }

        let bars = match self.source.daily_bars(&instrument, start, end).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!(
                    symbol,
                    source = self.source.name(),
                    error = %e,
                    "Price lookup failed, leaving prediction unverified"
                );
                return None;
            }
        };

        let change = compound_change(&bars, anchor, horizon_days);
        if change.is_some() && end < self.today() {
            self.cache.insert(key, bars);
        } else if change.is_none() && !bars.is_empty() {
            debug!(symbol, %anchor, horizon_days, "Horizon not yet covered, leaving prediction unverified");
        }
        change
    }

    /// Persists new cache entries. Failures are logged; the cache is only a memo.
    pub fn flush(&mut self) {
        if let Err(e) = self.cache.flush() {
            warn!(error = %e, "Failed to write price cache");
        }
    }
}

/// Compounds daily moves over the first `horizon_days` bars after `anchor`.
///
/// Each day's move is its close against the previous bar's close, the first
/// one measured against the last bar on or before the anchor. When there is
/// no earlier close, the provider's reported daily change is used instead.
/// Returns `None` unless all `horizon_days` bars after the anchor can be
/// measured.
#[must_use]
pub fn compound_change(bars: &[PriceBar], anchor: NaiveDate, horizon_days: u32) -> Option<f64> {
    let mut sorted: Vec<&PriceBar> = bars.iter().collect();
    sorted.sort_by_key(|b| b.date);

    let mut previous = sorted
        .iter()
        .filter(|b| b.date <= anchor)
        .last()
        .map(|b| b.close);
    let mut growth = 1.0;
    let mut measured = 0;

    for bar in sorted
        .iter()
        .filter(|b| b.date > anchor)
        .take(horizon_days as usize)
    {
        let daily = match previous {
            Some(prev) if prev > 0.0 => Some(bar.close / prev - 1.0),
            _ => bar.change_pct.map(|pct| pct / 100.0),
        };
        if let Some(daily) = daily {
            growth *= 1.0 + daily;
            measured += 1;
        }
        previous = Some(bar.close);
    }

    (horizon_days > 0 && measured == horizon_days as usize).then(|| (growth - 1.0) * 100.0)
}
