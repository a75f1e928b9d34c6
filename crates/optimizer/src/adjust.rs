//! Applying learned weights to a fresh prediction.

use newsalpha_core::{Direction, PredictionConfig, PredictionRecord};
use serde::{Deserialize, Serialize};

/// Below this signal weight a `down` call is treated as a contrarian `up`.
pub const FLIP_BELOW_WEIGHT: f64 = 0.6;
/// Confidence multiplier for a flipped call.
pub const FLIP_DISCOUNT: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedWeights {
    pub signal: f64,
    pub source: f64,
    pub stock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedPrediction {
    #[serde(flatten)]
    pub prediction: PredictionRecord,
    pub adjusted_direction: Direction,
    /// Capped at 1.0.
    pub adjusted_confidence: f64,
    pub weights_applied: AppliedWeights,
    pub should_trade: bool,
}

/// Weights a prediction's confidence by direction, source and symbol.
///
/// A `down` call whose direction weight has fallen below
/// [`FLIP_BELOW_WEIGHT`] is flipped to `up` at [`FLIP_DISCOUNT`] of the
/// weighted confidence. `should_trade` compares the uncapped confidence
/// against `min_confidence`.
#[must_use]
pub fn adjust_prediction(config: &PredictionConfig, prediction: &PredictionRecord) -> AdjustedPrediction {
    let direction = prediction.predicted_direction;
    let weights = AppliedWeights {
        signal: config.signal_weight(direction),
        source: config.source_weight(prediction.source),
        stock: prediction.symbol().map_or(1.0, |s| config.stock_weight(s)),
    };

    let mut confidence = prediction.confidence * weights.signal * weights.source * weights.stock;
    let adjusted_direction = if direction == Direction::Down && weights.signal < FLIP_BELOW_WEIGHT {
        confidence *= FLIP_DISCOUNT;
        Direction::Up
    } else {
        direction
    };

    AdjustedPrediction {
        prediction: prediction.clone(),
        adjusted_direction,
        adjusted_confidence: confidence.min(1.0),
        weights_applied: weights,
        should_trade: confidence >= config.min_confidence,
    }
}
