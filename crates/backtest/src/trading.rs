//! Paper-trading replay of verified predictions.
//!
//! Each directional prediction becomes one trade sized at a fixed fraction
//! of current capital: long for `up`, short for `down`. Flat calls are not
//! traded. Money is tracked in [`Decimal`]; ratios are reported as `f64`.

use chrono::NaiveDate;
use newsalpha_core::stats::{mean, round_to, sample_std};
use newsalpha_core::{Direction, VerifiedPrediction};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INITIAL_CAPITAL: Decimal = dec!(100000);
const DEFAULT_STAKE_FRACTION: Decimal = dec!(0.1);
const DEFAULT_KEEP_TRADES: usize = 20;
const ANNUAL_RISK_FREE: f64 = 0.02;
const TRADING_DAYS: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    pub date: NaiveDate,
    pub symbol: String,
    pub direction: Direction,
    pub position_size: Decimal,
    pub change_pct: f64,
    pub pnl: Decimal,
    pub capital_after: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingPerformance {
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    /// Percent.
    pub total_return: f64,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percent.
    pub win_rate: f64,
    /// Largest peak-to-trough equity decline, percent.
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
    /// Most recent trades only.
    pub trades: Vec<SimulatedTrade>,
}

/// Equity curve and per-trade returns for one replay.
struct EquityTracker {
    returns: Vec<f64>,
    equity_curve: Vec<Decimal>,
    wins: usize,
    losses: usize,
}

impl EquityTracker {
    fn new(initial_capital: Decimal) -> Self {
        Self {
            returns: Vec::new(),
            equity_curve: vec![initial_capital],
            wins: 0,
            losses: 0,
        }
    }

    fn initial(&self) -> Decimal {
        self.equity_curve.first().copied().unwrap_or_default()
    }

    fn current(&self) -> Decimal {
        self.equity_curve.last().copied().unwrap_or_default()
    }

    /// Books a trade. Break-even counts as a loss.
    fn add_trade(&mut self, pnl: Decimal) -> Decimal {
        let before = self.current();
        let after = before + pnl;
        self.equity_curve.push(after);

        if pnl > Decimal::ZERO {
            self.wins += 1;
        } else {
            self.losses += 1;
        }

        if !before.is_zero() {
            self.returns.push((pnl / before).to_f64().unwrap_or(0.0));
        }
        after
    }

    fn total_return_pct(&self) -> f64 {
        let initial = self.initial();
        if initial.is_zero() {
            return 0.0;
        }
        ((self.current() - initial) / initial * dec!(100))
            .to_f64()
            .unwrap_or(0.0)
    }

    fn max_drawdown_pct(&self) -> f64 {
        let mut max_drawdown = Decimal::ZERO;
        let mut peak = self.initial();

        for &equity in &self.equity_curve {
            if equity > peak {
                peak = equity;
            }
            if peak > Decimal::ZERO {
                let drawdown = (peak - equity) / peak;
                if drawdown > max_drawdown {
                    max_drawdown = drawdown;
                }
            }
        }

        (max_drawdown * dec!(100)).to_f64().unwrap_or(0.0)
    }

    /// Annualized, net of a daily risk-free rate. Zero with fewer than two
    /// returns or no dispersion.
    fn sharpe_ratio(&self) -> f64 {
        if self.returns.len() < 2 {
            return 0.0;
        }
        let std_dev = sample_std(&self.returns);
        if std_dev == 0.0 {
            return 0.0;
        }
        (mean(&self.returns) - ANNUAL_RISK_FREE / TRADING_DAYS) / std_dev * TRADING_DAYS.sqrt()
    }
}

/// Replays verified predictions as trades.
#[derive(Debug, Clone)]
pub struct TradeSimulator {
    stake_fraction: Decimal,
    keep_trades: usize,
}

impl Default for TradeSimulator {
    fn default() -> Self {
        Self {
            stake_fraction: DEFAULT_STAKE_FRACTION,
            keep_trades: DEFAULT_KEEP_TRADES,
        }
    }
}

impl TradeSimulator {
    #[must_use]
    pub fn with_stake_fraction(mut self, fraction: Decimal) -> Self {
        self.stake_fraction = fraction;
        self
    }

    #[must_use]
    pub fn with_keep_trades(mut self, keep: usize) -> Self {
        self.keep_trades = keep;
        self
    }

    /// Trades in anchor-date order; ties keep input order.
    #[must_use]
    pub fn simulate(&self, verified: &[VerifiedPrediction], initial_capital: Decimal) -> TradingPerformance {
        let mut ordered: Vec<&VerifiedPrediction> = verified.iter().collect();
        ordered.sort_by_key(|v| v.prediction.anchor_date);

        let mut tracker = EquityTracker::new(initial_capital);
        let mut trades = Vec::new();

        for v in ordered {
            let side = match v.prediction.predicted_direction.polarity() {
                Direction::Up => Decimal::ONE,
                Direction::Down => Decimal::NEGATIVE_ONE,
                _ => continue,
            };
            let Some(change) = Decimal::from_f64(v.actual_change_pct) else {
                continue;
            };

            let position_size = tracker.current() * self.stake_fraction;
            let pnl = position_size * change / dec!(100) * side;
            let capital_after = tracker.add_trade(pnl);

            trades.push(SimulatedTrade {
                date: v.prediction.anchor_date,
                symbol: v.instrument.clone(),
                direction: v.prediction.predicted_direction,
                position_size,
                change_pct: v.actual_change_pct,
                pnl,
                capital_after,
            });
        }

        let total_trades = tracker.wins + tracker.losses;
        #[allow(clippy::cast_precision_loss)]
        let win_rate = if total_trades > 0 {
            tracker.wins as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let total_return = tracker.total_return_pct();
        let max_drawdown = tracker.max_drawdown_pct();
        let calmar_ratio = if max_drawdown > 0.0 {
            total_return / max_drawdown
        } else {
            0.0
        };

        if trades.len() > self.keep_trades {
            trades.drain(..trades.len() - self.keep_trades);
        }

        TradingPerformance {
            initial_capital,
            final_capital: tracker.current(),
            total_return: round_to(total_return, 4),
            total_trades,
            wins: tracker.wins,
            losses: tracker.losses,
            win_rate: round_to(win_rate, 1),
            max_drawdown: round_to(max_drawdown, 4),
            sharpe_ratio: round_to(tracker.sharpe_ratio(), 4),
            calmar_ratio: round_to(calmar_ratio, 4),
            trades,
        }
    }
}

/// [`TradeSimulator`] with default sizing.
#[must_use]
pub fn simulate_trading(verified: &[VerifiedPrediction], initial_capital: Decimal) -> TradingPerformance {
    TradeSimulator::default().simulate(verified, initial_capital)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::Verifier;
    use chrono::Utc;
    use newsalpha_core::{PredictionRecord, Source, Target};

    fn verified(symbol: &str, day: u32, direction: Direction, change: f64) -> VerifiedPrediction {
        let record = PredictionRecord::new(
            Target::symbol(symbol),
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            direction,
            Source::WeeklyAnalysis,
        );
        Verifier::new(1.0).judge(&record, change, symbol, Utc::now())
    }

    // ============================================================
    // Replay
    // ============================================================

    #[test]
    fn no_trades_keeps_capital() {
        let perf = simulate_trading(&[], dec!(10000));
        assert_eq!(perf.final_capital, dec!(10000));
        assert_eq!(perf.total_trades, 0);
        assert_eq!(perf.win_rate, 0.0);
        assert_eq!(perf.sharpe_ratio, 0.0);
        assert_eq!(perf.max_drawdown, 0.0);
    }

    #[test]
    fn flat_predictions_are_not_traded() {
        let perf = simulate_trading(&[verified("AAA", 1, Direction::Flat, 5.0)], dec!(10000));
        assert_eq!(perf.total_trades, 0);
        assert!(perf.trades.is_empty());
    }

    #[test]
    fn long_and_short_trades_compound() {
        let data = vec![
            verified("AAA", 1, Direction::Up, 3.0),
            verified("BBB", 2, Direction::Down, 2.0),
        ];
        let perf = simulate_trading(&data, dec!(10000));

        // 10% of 10000 long, +3% -> +30
        assert_eq!(perf.trades[0].position_size, dec!(1000));
        assert_eq!(perf.trades[0].pnl, dec!(30));
        // 10% of 10030 short into a +2% move -> -20.06
        assert_eq!(perf.trades[1].pnl, dec!(-20.06));
        assert_eq!(perf.final_capital, dec!(10009.94));

        assert_eq!(perf.wins, 1);
        assert_eq!(perf.losses, 1);
        assert!((perf.win_rate - 50.0).abs() < f64::EPSILON);
        assert!((perf.max_drawdown - 0.2).abs() < 1e-9);
        assert!(perf.calmar_ratio > 0.0);
    }

    #[test]
    fn break_even_counts_as_loss() {
        let perf = simulate_trading(&[verified("AAA", 1, Direction::Up, 0.0)], dec!(10000));
        assert_eq!(perf.losses, 1);
        assert_eq!(perf.wins, 0);
    }

    #[test]
    fn only_recent_trades_are_kept() {
        let data: Vec<_> = (1..=25)
            .map(|d| verified("AAA", d, Direction::Up, 1.0))
            .collect();
        let perf = simulate_trading(&data, dec!(10000));

        assert_eq!(perf.total_trades, 25);
        assert_eq!(perf.trades.len(), 20);
        assert_eq!(perf.trades[0].date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    }

    #[test]
    fn sharpe_needs_two_returns() {
        let single = vec![verified("AAA", 1, Direction::Up, 4.0)];
        assert_eq!(simulate_trading(&single, dec!(10000)).sharpe_ratio, 0.0);

        let mixed = vec![
            verified("AAA", 1, Direction::Up, 4.0),
            verified("AAA", 2, Direction::Up, 1.0),
            verified("AAA", 3, Direction::Up, 3.0),
        ];
        assert!(simulate_trading(&mixed, dec!(10000)).sharpe_ratio > 0.0);
    }
}
