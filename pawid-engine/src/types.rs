//! Core types shared by the normalizer, ensemble selector, decision policy and orchestrator
//!
//! Data flows one direction:
//! raw upstream JSON → [`PredictionSet`] → [`CategoryResult`] per category → winning
//! [`PredictionSet`] → [`Verdict`].

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Category
// ============================================================================

/// Species-specific classification backend identifier
///
/// Serializes as a lowercase string (`"dog"`, `"cat"`, or the custom name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Dog,
    Cat,
    /// Any other configured category (e.g. "rabbit")
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Dog => "dog",
            Category::Cat => "cat",
            Category::Other(name) => name,
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "dog" => Category::Dog,
            "cat" => Category::Cat,
            _ => Category::Other(normalized),
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::from(value.as_str())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Prediction / PredictionSet
// ============================================================================

/// Canonical (label, confidence) pair
///
/// Confidence is always finite and within 0.0-1.0. Serialized with the upstream
/// wire name `class` for the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: f64,
}

impl Prediction {
    /// Create a prediction, coercing confidence into range
    ///
    /// Returns `None` for a blank label. NaN and infinities become 0.0; everything
    /// else is clamped to 0.0-1.0.
    pub fn new(label: impl Into<String>, confidence: f64) -> Option<Self> {
        let label = label.into().trim().to_string();
        if label.is_empty() {
            return None;
        }

        Some(Self {
            label,
            confidence: sanitize_confidence(confidence),
        })
    }

    /// Confidence as a one-decimal percentage, e.g. `"87.5%"`
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }
}

/// Coerce any float into a usable confidence
///
/// Zero, negatives (including `-0.0`) and non-finite values all become `0.0`, so
/// equal confidences compare equal under `total_cmp`.
pub fn sanitize_confidence(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value.min(1.0)
    } else {
        0.0
    }
}

/// Predictions sorted descending by confidence
///
/// Ties keep arrival order (stable sort). Duplicate labels are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionSet(Vec<Prediction>);

impl PredictionSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a set from predictions in arrival order
    pub fn from_unsorted(mut predictions: Vec<Prediction>) -> Self {
        // sort_by is stable, so equal confidences keep arrival order
        predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Self(predictions)
    }

    /// Highest confidence, 0.0 if empty
    pub fn top_confidence(&self) -> f64 {
        self.0.first().map(|p| p.confidence).unwrap_or(0.0)
    }

    /// Second-highest confidence, 0.0 if absent
    pub fn second_confidence(&self) -> f64 {
        self.0.get(1).map(|p| p.confidence).unwrap_or(0.0)
    }

    pub fn top(&self) -> Option<&Prediction> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Prediction] {
        &self.0
    }

    /// Keep only the `n` highest-confidence entries
    pub fn truncated(mut self, n: usize) -> Self {
        self.0.truncate(n);
        self
    }

    pub fn into_vec(self) -> Vec<Prediction> {
        self.0
    }
}

impl<'a> IntoIterator for &'a PredictionSet {
    type Item = &'a Prediction;
    type IntoIter = std::slice::Iter<'a, Prediction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// CategoryResult
// ============================================================================

/// Normalized outcome of one backend call
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryResult {
    pub category: Category,
    pub predictions: PredictionSet,
    /// `predictions[0].confidence`, or 0.0 when empty
    pub top_confidence: f64,
    /// Why the backend call failed, if it did
    pub failure: Option<String>,
}

impl CategoryResult {
    pub fn new(category: Category, predictions: PredictionSet) -> Self {
        let top_confidence = predictions.top_confidence();
        Self {
            category,
            predictions,
            top_confidence,
            failure: None,
        }
    }

    /// Zero-confidence placeholder for a failed backend call
    pub fn failed(category: Category, reason: impl Into<String>) -> Self {
        Self {
            category,
            predictions: PredictionSet::new(),
            top_confidence: 0.0,
            failure: Some(reason.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

// ============================================================================
// Verdict
// ============================================================================

/// Backend failure reported inside an indeterminate verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFailure {
    pub category: Category,
    pub reason: String,
}

/// Whether a decision was possible at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictStatus {
    /// At least one backend answered; flags reflect the decision policy
    Decided,
    /// Every backend failed
    Indeterminate { failures: Vec<BackendFailure> },
}

/// Final classification result for one image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub success: bool,
    pub category: Category,
    pub is_unknown: bool,
    pub possible_mix: bool,
    pub predictions: PredictionSet,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub indeterminate: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BackendFailure>,
}

impl Verdict {
    /// Verdict produced by the decision policy
    pub fn decided(
        category: Category,
        is_unknown: bool,
        possible_mix: bool,
        predictions: PredictionSet,
    ) -> Self {
        Self {
            success: true,
            category,
            is_unknown,
            possible_mix,
            predictions,
            indeterminate: false,
            failures: Vec::new(),
        }
    }

    /// Verdict for a request where every backend failed
    pub fn indeterminate(category: Category, failures: Vec<BackendFailure>) -> Self {
        Self {
            success: false,
            category,
            is_unknown: true,
            possible_mix: false,
            predictions: PredictionSet::new(),
            indeterminate: true,
            failures,
        }
    }

    pub fn status(&self) -> VerdictStatus {
        if self.indeterminate {
            VerdictStatus::Indeterminate {
                failures: self.failures.clone(),
            }
        } else {
            VerdictStatus::Decided
        }
    }

    /// Best label, if the verdict is decided and known
    pub fn top_label(&self) -> Option<&str> {
        self.predictions.top().map(|p| p.label.as_str())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indeterminate {
            return write!(
                f,
                "{}: indeterminate ({} backend failures)",
                self.category,
                self.failures.len()
            );
        }
        if self.is_unknown {
            return write!(f, "{}: unknown", self.category);
        }

        write!(f, "{}:", self.category)?;
        for (i, prediction) in self.predictions.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{} {}", sep, prediction.label, prediction.confidence_percent())?;
        }
        if self.possible_mix {
            write!(f, " (possible mix)")?;
        }
        Ok(())
    }
}
