//! Response Normalizer
//!
//! Turns an untrusted upstream classification payload into a [`PredictionSet`].
//! The payload shape is detected once into [`UpstreamShape`] and then dispatched;
//! nothing in this module returns an error. Anything that cannot be understood
//! degrades to a zero confidence or an empty set.
//!
//! # Recognized shapes
//! - **List**: `[{"class": "Pug", "confidence": 0.7}, ...]`, either bare or under
//!   `predictions`
//! - **Label map**: `{"predictions": {"Pug": 0.7, "Beagle": 0.3}}`; values may also be
//!   objects such as `{"confidence": 0.7}`
//! - **Singleton**: `{"top": "Pug", "confidence": 0.9}`
//! - **Unrecognized**: anything else → empty set

use crate::types::{sanitize_confidence, Prediction, PredictionSet};
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Keys probed for a label, first present non-empty wins
pub const LABEL_KEYS: [&str; 3] = ["class", "label", "name"];

/// Keys probed for a confidence, first present wins
pub const CONFIDENCE_KEYS: [&str; 3] = ["confidence", "probability", "score"];

/// Upstream payload shapes, detected from structural markers
#[derive(Debug, Clone, Copy)]
pub enum UpstreamShape<'a> {
    /// Sequence of prediction objects
    List(&'a [Value]),
    /// Object mapping label → confidence
    LabelMap(&'a Map<String, Value>),
    /// Single top label with optional confidence
    Singleton {
        label: &'a Value,
        confidence: Option<&'a Value>,
    },
    Unrecognized,
}

impl<'a> UpstreamShape<'a> {
    /// Inspect the payload once and pick a variant
    ///
    /// A `predictions` member takes precedence over `top`, since single-label
    /// responses often carry both and the list is richer.
    pub fn detect(raw: &'a Value) -> Self {
        match raw {
            Value::Array(items) => UpstreamShape::List(items),
            Value::Object(obj) => match obj.get("predictions") {
                Some(Value::Array(items)) => UpstreamShape::List(items),
                Some(Value::Object(map)) => UpstreamShape::LabelMap(map),
                _ => match obj.get("top") {
                    Some(label) if !label.is_null() => UpstreamShape::Singleton {
                        label,
                        confidence: obj.get("confidence"),
                    },
                    _ => UpstreamShape::Unrecognized,
                },
            },
            _ => UpstreamShape::Unrecognized,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpstreamShape::List(_) => "list",
            UpstreamShape::LabelMap(_) => "label_map",
            UpstreamShape::Singleton { .. } => "singleton",
            UpstreamShape::Unrecognized => "unrecognized",
        }
    }
}

/// Normalize an arbitrary upstream payload into a sorted prediction set
pub fn normalize(raw: &Value) -> PredictionSet {
    let shape = UpstreamShape::detect(raw);

    let predictions: Vec<Prediction> = match shape {
        UpstreamShape::List(items) => items.iter().filter_map(list_entry).collect(),
        UpstreamShape::LabelMap(map) => map
            .iter()
            .filter_map(|(label, value)| Prediction::new(label.as_str(), map_value_confidence(value)))
            .collect(),
        UpstreamShape::Singleton { label, confidence } => coerce_label(label)
            .and_then(|label| Prediction::new(label, confidence.map(coerce_confidence).unwrap_or(0.0)))
            .into_iter()
            .collect(),
        UpstreamShape::Unrecognized => Vec::new(),
    };

    debug!(
        shape = shape.name(),
        count = predictions.len(),
        "Normalized upstream payload"
    );

    PredictionSet::from_unsorted(predictions)
}

/// One element of a list-shaped payload; `None` when no label resolves
fn list_entry(item: &Value) -> Option<Prediction> {
    let obj = item.as_object()?;

    let label = LABEL_KEYS
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(coerce_label);

    let Some(label) = label else {
        trace!("Dropping prediction entry without a label");
        return None;
    };

    let confidence = CONFIDENCE_KEYS
        .iter()
        .find_map(|key| obj.get(*key))
        .map(coerce_confidence)
        .unwrap_or(0.0);

    Prediction::new(label, confidence)
}

/// Label-map values are bare numbers or objects carrying a confidence key
fn map_value_confidence(value: &Value) -> f64 {
    match value {
        Value::Object(obj) => CONFIDENCE_KEYS
            .iter()
            .find_map(|key| obj.get(*key))
            .map(coerce_confidence)
            .unwrap_or(0.0),
        other => coerce_confidence(other),
    }
}

/// Strings (non-blank) and numbers are usable labels
fn coerce_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers and numeric strings become confidences; everything else is 0.0
fn coerce_confidence(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    sanitize_confidence(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(set: &PredictionSet) -> Vec<(String, f64)> {
        set.iter().map(|p| (p.label.clone(), p.confidence)).collect()
    }

    #[test]
    fn test_detect_shapes() {
        assert_eq!(UpstreamShape::detect(&json!([])).name(), "list");
        assert_eq!(UpstreamShape::detect(&json!({"predictions": []})).name(), "list");
        assert_eq!(UpstreamShape::detect(&json!({"predictions": {}})).name(), "label_map");
        assert_eq!(UpstreamShape::detect(&json!({"top": "Pug"})).name(), "singleton");
        assert_eq!(UpstreamShape::detect(&json!({})).name(), "unrecognized");
        assert_eq!(UpstreamShape::detect(&json!("Pug")).name(), "unrecognized");
        assert_eq!(UpstreamShape::detect(&json!({"top": null})).name(), "unrecognized");
    }

    #[test]
    fn test_predictions_list_wins_over_top() {
        let raw = json!({
            "top": "Pug",
            "confidence": 0.9,
            "predictions": [{"class": "Pug", "confidence": 0.9}, {"class": "Boxer", "confidence": 0.05}]
        });
        assert_eq!(normalize(&raw).len(), 2);
    }

    #[test]
    fn test_array_shape() {
        let set = normalize(&json!({"predictions": [{"class": "Pug", "confidence": 0.7}]}));
        assert_eq!(pairs(&set), vec![("Pug".to_string(), 0.7)]);
    }

    #[test]
    fn test_array_shape_alternate_keys_and_order() {
        let set = normalize(&json!([
            {"name": "Beagle", "score": 0.2},
            {"label": "Pug", "probability": 0.6},
            {"class": "", "label": "Boxer", "confidence": 0.4}
        ]));
        assert_eq!(
            pairs(&set),
            vec![
                ("Pug".to_string(), 0.6),
                ("Boxer".to_string(), 0.4),
                ("Beagle".to_string(), 0.2)
            ]
        );
    }

    #[test]
    fn test_array_shape_first_confidence_key_wins() {
        let set = normalize(&json!([{"class": "Pug", "confidence": 0.3, "score": 0.9}]));
        assert_eq!(set.top_confidence(), 0.3);
    }

    #[test]
    fn test_array_shape_drops_unlabeled_and_non_objects() {
        let set = normalize(&json!([
            {"confidence": 0.9},
            42,
            null,
            {"class": "Pug"}
        ]));
        assert_eq!(pairs(&set), vec![("Pug".to_string(), 0.0)]);
    }

    #[test]
    fn test_confidence_coercion() {
        let set = normalize(&json!([
            {"class": "A", "confidence": "0.55"},
            {"class": "B", "confidence": "high"},
            {"class": "C", "confidence": null},
            {"class": "D", "confidence": 12},
            {"class": "E", "confidence": -1}
        ]));
        let got: Vec<_> = pairs(&set);
        assert_eq!(got[0], ("D".to_string(), 1.0));
        assert_eq!(got[1], ("A".to_string(), 0.55));
        assert!(got[2..].iter().all(|(_, c)| *c == 0.0));
    }

    #[test]
    fn test_negative_zero_ties_keep_arrival_order() {
        let set = normalize(&json!([
            {"class": "A", "confidence": -0.0},
            {"class": "B", "confidence": 0.0}
        ]));
        assert_eq!(
            pairs(&set),
            vec![("A".to_string(), 0.0), ("B".to_string(), 0.0)]
        );
        assert!(set.iter().all(|p| p.confidence.is_sign_positive()));

        let wire = serde_json::to_string(&set).unwrap();
        assert_eq!(
            wire,
            r#"[{"class":"A","confidence":0.0},{"class":"B","confidence":0.0}]"#
        );
    }

    #[test]
    fn test_map_shape() {
        let set = normalize(&json!({"predictions": {"Beagle": 0.3, "Pug": 0.7}}));
        assert_eq!(
            pairs(&set),
            vec![("Pug".to_string(), 0.7), ("Beagle".to_string(), 0.3)]
        );
    }

    #[test]
    fn test_map_shape_with_object_values() {
        let set = normalize(&json!({
            "predictions": {"Pug": {"confidence": 0.8, "class_id": 3}, "Beagle": {"oops": true}}
        }));
        assert_eq!(
            pairs(&set),
            vec![("Pug".to_string(), 0.8), ("Beagle".to_string(), 0.0)]
        );
    }

    #[test]
    fn test_map_shape_ties_keep_arrival_order() {
        let set = normalize(&json!({"predictions": {"Zebra": 0.5, "Aardvark": 0.5}}));
        assert_eq!(set.as_slice()[0].label, "Zebra");
    }

    #[test]
    fn test_singleton_shape() {
        let set = normalize(&json!({"top": "Pug", "confidence": 0.9}));
        assert_eq!(pairs(&set), vec![("Pug".to_string(), 0.9)]);

        let no_conf = normalize(&json!({"top": "Pug"}));
        assert_eq!(pairs(&no_conf), vec![("Pug".to_string(), 0.0)]);

        let blank = normalize(&json!({"top": "  ", "confidence": 0.9}));
        assert!(blank.is_empty());
    }

    #[test]
    fn test_garbage_is_empty() {
        assert!(normalize(&json!({})).is_empty());
        assert!(normalize(&json!(null)).is_empty());
        assert!(normalize(&json!(3.5)).is_empty());
        assert!(normalize(&json!({"predictions": "Pug"})).is_empty());
        assert!(normalize(&json!({"error": "quota exceeded"})).is_empty());
    }

    #[test]
    fn test_duplicate_labels_are_kept() {
        let set = normalize(&json!([
            {"class": "Pug", "confidence": 0.6},
            {"class": "Pug", "confidence": 0.3}
        ]));
        assert_eq!(set.len(), 2);
    }
}
