//! Decision Policy
//!
//! Applies confidence thresholds to the winning prediction list:
//! 1. `top` = best confidence (0 if empty), `second` = runner-up (0 if absent)
//! 2. Unknown iff `top < top_min` or `top - second < gap_min`; unknown empties the list.
//!    Both bounds are inclusive: a top or gap exactly at the threshold is decided. The
//!    gap is computed by subtraction, so it is compared with [`GAP_TOLERANCE`] slack
//!    (`0.47 - 0.35` evaluates to `0.11999999999999997`).
//! 3. Possible mix iff more than one prediction reaches `mix`
//! 4. Otherwise the list is truncated to `top_n`
//!
//! Pure function of its inputs.

use crate::error::ConfigError;
use crate::types::PredictionSet;
use pawid_common::config::ThresholdConfig;
use tracing::debug;

/// Rounding slack for the gap comparison; far below any meaningful confidence step
pub const GAP_TOLERANCE: f64 = 1e-9;

/// Tunable thresholds for [`decide`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionThresholds {
    pub top_min: f64,
    pub gap_min: f64,
    pub mix: f64,
    pub top_n: usize,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            top_min: 0.35,
            gap_min: 0.12,
            mix: 0.20,
            top_n: 5,
        }
    }
}

impl DecisionThresholds {
    /// Reject thresholds outside 0.0-1.0 and an empty result bound
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("top_min", self.top_min),
            ("gap_min", self.gap_min),
            ("mix", self.mix),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if self.top_n == 0 {
            return Err(ConfigError::InvalidTopN);
        }
        Ok(())
    }
}

impl TryFrom<&ThresholdConfig> for DecisionThresholds {
    type Error = ConfigError;

    fn try_from(config: &ThresholdConfig) -> Result<Self, Self::Error> {
        let thresholds = Self {
            top_min: config.top_min,
            gap_min: config.gap_min,
            mix: config.mix,
            top_n: config.top_n,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }
}

/// Outcome of the decision policy
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub is_unknown: bool,
    pub possible_mix: bool,
    /// Empty when unknown, otherwise at most `top_n` entries
    pub predictions: PredictionSet,
}

/// Apply the thresholds to a sorted prediction list
pub fn decide(predictions: PredictionSet, thresholds: &DecisionThresholds) -> Decision {
    let top = predictions.top_confidence();
    let second = predictions.second_confidence();
    let gap = top - second;

    let is_unknown = top < thresholds.top_min || gap < thresholds.gap_min - GAP_TOLERANCE;

    let above_mix = predictions
        .iter()
        .filter(|p| p.confidence >= thresholds.mix)
        .count();
    let possible_mix = above_mix > 1;

    debug!(
        top,
        second,
        gap,
        above_mix,
        is_unknown,
        possible_mix,
        "Decision policy applied"
    );

    let predictions = if is_unknown {
        PredictionSet::new()
    } else {
        predictions.truncated(thresholds.top_n)
    };

    Decision {
        is_unknown,
        possible_mix,
        predictions,
    }
}
