//! Result document intake: parse untrusted text, check presence and container shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::PcaError;

pub const POINTS: &str = "points";
pub const EXPLAINED_VARIANCE: &str = "explained_variance_ratio_all";
pub const CUMULATIVE_VARIANCE: &str = "cumulative_variance_ratio_all";

/// Top-level keys every result file must carry, in reporting order.
pub const REQUIRED_FIELDS: [&str; 3] = [POINTS, EXPLAINED_VARIANCE, CUMULATIVE_VARIANCE];

const MIN_COMPONENTS: usize = 2;
const RATIO_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResultDocument {
    pub points: Vec<Point>,
    pub explained_variance_ratio_all: Vec<f64>,
    pub cumulative_variance_ratio_all: Vec<f64>,
}

impl ResultDocument {
    pub fn component_count(&self) -> usize {
        self.explained_variance_ratio_all.len()
    }

    /// Fails when either ratio sequence is too short to read PC1 and PC2.
    pub fn ensure_components(&self) -> Result<(), PcaError> {
        for (field, values) in [
            (EXPLAINED_VARIANCE, &self.explained_variance_ratio_all),
            (CUMULATIVE_VARIANCE, &self.cumulative_variance_ratio_all),
        ] {
            if values.len() < MIN_COMPONENTS {
                return Err(PcaError::InsufficientComponents {
                    field: field.to_string(),
                    len: values.len(),
                });
            }
        }
        Ok(())
    }

    /// Soft consistency findings. None of these block rendering.
    pub fn consistency_warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        let ratios = &self.explained_variance_ratio_all;
        let cumulative = &self.cumulative_variance_ratio_all;

        if ratios.len() != cumulative.len() {
            out.push(format!(
                "{EXPLAINED_VARIANCE} has {} entries but {CUMULATIVE_VARIANCE} has {}",
                ratios.len(),
                cumulative.len()
            ));
        }
        for (field, values) in [(EXPLAINED_VARIANCE, ratios), (CUMULATIVE_VARIANCE, cumulative)] {
            if let Some((idx, v)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| **v < -RATIO_TOLERANCE || **v > 1.0 + RATIO_TOLERANCE)
            {
                out.push(format!("{field}[{idx}] = {v} lies outside [0, 1]"));
            }
        }
        if let Some(idx) = cumulative
            .windows(2)
            .position(|w| w[1] + RATIO_TOLERANCE < w[0])
        {
            out.push(format!(
                "{CUMULATIVE_VARIANCE} decreases at index {}",
                idx + 1
            ));
        }

        let mut running = 0.0;
        for (idx, (ratio, cum)) in ratios.iter().zip(cumulative.iter()).enumerate() {
            running += ratio;
            if (running - cum).abs() > RATIO_TOLERANCE {
                out.push(format!(
                    "{CUMULATIVE_VARIANCE}[{idx}] = {cum} differs from running sum {running:.6}"
                ));
                break;
            }
        }
        out
    }
}

/// Parse raw text into a [`ResultDocument`].
///
/// Extra top-level keys are ignored. Missing or `null` required keys are reported
/// together; present keys with the wrong container shape fail individually.
pub fn validate(raw: &str) -> Result<ResultDocument, PcaError> {
    let value: JsonValue =
        serde_json::from_str(raw).map_err(|e| PcaError::MalformedJson(e.to_string()))?;
    let object = value.as_object().ok_or(PcaError::NotAnObject)?;

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|key| object.get(**key).map_or(true, JsonValue::is_null))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PcaError::MissingRequiredFields(missing));
    }

    let doc = ResultDocument {
        points: parse_points(object)?,
        explained_variance_ratio_all: parse_ratios(object, EXPLAINED_VARIANCE)?,
        cumulative_variance_ratio_all: parse_ratios(object, CUMULATIVE_VARIANCE)?,
    };
    doc.ensure_components()?;

    for note in doc.consistency_warnings() {
        warn!("{note}");
    }
    debug!(
        points = doc.points.len(),
        components = doc.component_count(),
        "result document accepted"
    );
    Ok(doc)
}

fn parse_points(object: &Map<String, JsonValue>) -> Result<Vec<Point>, PcaError> {
    let items = object[POINTS].as_array().ok_or_else(|| PcaError::InvalidField {
        field: POINTS.to_string(),
        reason: format!("expected an array, found {}", kind_of(&object[POINTS])),
    })?;
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            Point::deserialize(item).map_err(|e| PcaError::InvalidField {
                field: format!("{POINTS}[{idx}]"),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn parse_ratios(object: &Map<String, JsonValue>, field: &str) -> Result<Vec<f64>, PcaError> {
    let items = object[field].as_array().ok_or_else(|| PcaError::InvalidField {
        field: field.to_string(),
        reason: format!("expected an array, found {}", kind_of(&object[field])),
    })?;
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_f64().ok_or_else(|| PcaError::InvalidField {
                field: format!("{field}[{idx}]"),
                reason: format!("expected a number, found {}", kind_of(item)),
            })
        })
        .collect()
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_POINTS: &str = r#"{
        "points": [{"x": 1, "y": 2, "label": "A"}, {"x": 3, "y": 4, "label": "B"}],
        "explained_variance_ratio_all": [0.6, 0.3],
        "cumulative_variance_ratio_all": [0.6, 0.9]
    }"#;

    #[test]
    fn accepts_minimal_document() {
        let doc = validate(TWO_POINTS).unwrap();
        assert_eq!(doc.points.len(), 2);
        assert_eq!(doc.points[1], Point { x: 3.0, y: 4.0, label: "B".into() });
        assert_eq!(doc.explained_variance_ratio_all, vec![0.6, 0.3]);
        assert!(doc.consistency_warnings().is_empty());
    }

    #[test]
    fn ignores_extra_fields() {
        let raw = r#"{
            "points": [], "explained_variance_ratio_all": [0.5, 0.2],
            "cumulative_variance_ratio_all": [0.5, 0.7],
            "n_components": 2, "source_files": ["a.pdb"]
        }"#;
        assert!(validate(raw).is_ok());
    }

    #[test]
    fn syntax_error_is_malformed_json() {
        assert!(matches!(validate("{ \"points\": ["), Err(PcaError::MalformedJson(_))));
    }

    #[test]
    fn top_level_array_is_rejected() {
        assert_eq!(validate("[1, 2]"), Err(PcaError::NotAnObject));
    }

    #[test]
    fn missing_and_null_fields_are_aggregated() {
        let err = validate(r#"{ "points": [], "cumulative_variance_ratio_all": null }"#)
            .unwrap_err();
        assert_eq!(
            err,
            PcaError::MissingRequiredFields(vec![
                EXPLAINED_VARIANCE.to_string(),
                CUMULATIVE_VARIANCE.to_string()
            ])
        );
        assert!(err.to_string().contains("explained_variance_ratio_all, cumulative_variance_ratio_all"));
    }

    #[test]
    fn wrong_container_shape_names_the_field() {
        let raw = r#"{ "points": {}, "explained_variance_ratio_all": [0.5, 0.2],
                       "cumulative_variance_ratio_all": [0.5, 0.7] }"#;
        match validate(raw) {
            Err(PcaError::InvalidField { field, reason }) => {
                assert_eq!(field, "points");
                assert!(reason.contains("an object"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let raw = r#"{ "points": [], "explained_variance_ratio_all": [0.5, "x"],
                       "cumulative_variance_ratio_all": [0.5, 0.7] }"#;
        assert!(matches!(
            validate(raw),
            Err(PcaError::InvalidField { field, .. }) if field == "explained_variance_ratio_all[1]"
        ));
    }

    #[test]
    fn point_without_coordinates_is_invalid() {
        let raw = r#"{ "points": [{"x": 1, "label": "a"}], "explained_variance_ratio_all": [0.5, 0.2],
                       "cumulative_variance_ratio_all": [0.5, 0.7] }"#;
        assert!(matches!(
            validate(raw),
            Err(PcaError::InvalidField { field, .. }) if field == "points[0]"
        ));
    }

    #[test]
    fn missing_label_defaults_to_empty() {
        let raw = r#"{ "points": [{"x": 1, "y": 2}], "explained_variance_ratio_all": [0.5, 0.2],
                       "cumulative_variance_ratio_all": [0.5, 0.7] }"#;
        assert_eq!(validate(raw).unwrap().points[0].label, "");
    }

    #[test]
    fn single_component_is_insufficient() {
        let raw = r#"{ "points": [], "explained_variance_ratio_all": [0.9],
                       "cumulative_variance_ratio_all": [0.9] }"#;
        assert_eq!(
            validate(raw),
            Err(PcaError::InsufficientComponents {
                field: EXPLAINED_VARIANCE.to_string(),
                len: 1
            })
        );
    }

    #[test]
    fn revalidating_serialized_form_is_stable() {
        let doc = validate(TWO_POINTS).unwrap();
        let text = serde_json::to_string(&doc).unwrap();
        assert_eq!(validate(&text).unwrap(), doc);
    }

    #[test]
    fn warnings_flag_inconsistent_cumulative_sequence() {
        let doc = ResultDocument {
            points: Vec::new(),
            explained_variance_ratio_all: vec![0.6, 0.3, 0.05],
            cumulative_variance_ratio_all: vec![0.6, 0.5],
        };
        let notes = doc.consistency_warnings();
        assert!(notes.iter().any(|n| n.contains("has 3 entries")));
        assert!(notes.iter().any(|n| n.contains("decreases at index 1")));
        assert!(notes.iter().any(|n| n.contains("running sum")));
    }

    #[test]
    fn warnings_flag_ratios_outside_unit_interval() {
        let doc = ResultDocument {
            points: Vec::new(),
            explained_variance_ratio_all: vec![1.2, -0.1],
            cumulative_variance_ratio_all: vec![0.6, 0.9],
        };
        let notes = doc.consistency_warnings();
        assert!(notes
            .iter()
            .any(|n| n == "explained_variance_ratio_all[0] = 1.2 lies outside [0, 1]"));
        assert!(!notes
            .iter()
            .any(|n| n.starts_with("cumulative_variance_ratio_all[") && n.contains("outside")));
    }
}
