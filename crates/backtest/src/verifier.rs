//! Judging predictions against realized moves.

use chrono::{DateTime, NaiveDate, Utc};
use newsalpha_core::{Direction, PredictionRecord, VerifiedPrediction};
use newsalpha_data::PriceOutcomeResolver;
use tracing::debug;

/// Classifies a realized percentage move.
///
/// `up` iff `change > threshold`, `down` iff `change < -threshold`, else `flat`.
#[must_use]
pub fn classify(change_pct: f64, threshold: f64) -> Direction {
    if change_pct > threshold {
        Direction::Up
    } else if change_pct < -threshold {
        Direction::Down
    } else {
        Direction::Flat
    }
}

/// Correctness rule.
///
/// A prediction is correct when its polarity matches the realized direction.
/// A flat prediction is also correct whenever the move stayed inside twice
/// the classification band, which is wider than the band itself.
#[must_use]
pub fn is_correct(predicted: Direction, actual: Direction, change_pct: f64, threshold: f64) -> bool {
    let predicted = predicted.polarity();
    predicted == actual.polarity()
        || (predicted == Direction::Flat && change_pct.abs() < 2.0 * threshold)
}

/// True once the prediction's window has elapsed in calendar days, plus a
/// buffer. The horizon counts trading sessions, so a mature prediction can
/// still come back unresolved until the price series covers it.
#[must_use]
pub fn is_mature(prediction: &PredictionRecord, today: NaiveDate, buffer_days: i64) -> bool {
    let age = (today - prediction.anchor_date).num_days();
    age > i64::from(prediction.horizon_days) + buffer_days
}

/// Verifies predictions at one classification threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verifier {
    threshold: f64,
}

impl Verifier {
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Builds the verified record for an already-resolved move.
    ///
    /// Event predictions report the realized direction as a stance so it
    /// reads in the same vocabulary as the prediction.
    #[must_use]
    pub fn judge(
        &self,
        prediction: &PredictionRecord,
        change_pct: f64,
        instrument: impl Into<String>,
        verified_at: DateTime<Utc>,
    ) -> VerifiedPrediction {
        let mut actual = classify(change_pct, self.threshold);
        if prediction.predicted_direction.is_stance() {
            actual = actual.as_stance();
        }

        VerifiedPrediction {
            prediction: prediction.clone(),
            instrument: instrument.into(),
            actual_change_pct: change_pct,
            actual_direction: actual,
            threshold: self.threshold,
            is_correct: is_correct(prediction.predicted_direction, actual, change_pct, self.threshold),
            verified_at,
        }
    }

    /// Resolves the realized move and judges the prediction.
    ///
    /// Returns `None` when the move cannot be resolved; the prediction stays
    /// pending and is excluded from every statistic.
    pub async fn verify(
        &self,
        prediction: &PredictionRecord,
        resolver: &mut PriceOutcomeResolver,
        verified_at: DateTime<Utc>,
    ) -> Option<VerifiedPrediction> {
        let Some(resolved) = resolver
            .get_change(&prediction.target, prediction.anchor_date, prediction.horizon_days)
            .await
        else {
            debug!(
                prediction = prediction.target.key(),
                anchor = %prediction.anchor_date,
                "Outcome unresolvable"
            );
            return None;
        };

        Some(self.judge(prediction, resolved.change_pct, resolved.instrument, verified_at))
    }
}
