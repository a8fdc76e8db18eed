//! Ensemble Selector
//!
//! Picks the winning category from independently-queried per-category results.
//! Highest `top_confidence` wins; ties go to the category registered first.
//! Failed calls arrive here as zero-confidence results and simply lose, so one
//! bad backend never blocks a healthy one.
//!
//! The selector never decides "unknown"; that belongs to the decision policy.

use crate::types::{Category, CategoryResult, PredictionSet};
use tracing::debug;

/// Winning category and its prediction list
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleWinner {
    pub category: Category,
    pub predictions: PredictionSet,
}

/// Select the winner from results given in priority (registration) order
///
/// Returns `None` only when `results` is empty. When every list is empty the first
/// category wins with an empty list.
pub fn select(results: Vec<CategoryResult>) -> Option<EnsembleWinner> {
    let mut winner: Option<CategoryResult> = None;

    for result in results {
        debug!(
            category = %result.category,
            top_confidence = result.top_confidence,
            failed = result.is_failure(),
            "Ensemble candidate"
        );

        // Strict comparison: an equal score never displaces an earlier category
        let replace = match &winner {
            None => true,
            Some(current) => result.top_confidence > current.top_confidence,
        };
        if replace {
            winner = Some(result);
        }
    }

    winner.map(|w| {
        debug!(
            category = %w.category,
            top_confidence = w.top_confidence,
            "Ensemble winner selected"
        );
        EnsembleWinner {
            category: w.category,
            predictions: w.predictions,
        }
    })
}
