//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - edited in-memory by the form state
//! - sent as the JSON request body
//! - written to and reloaded from feature files

use clap::ValueEnum;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::features::{CATALOG, FeatureSpec, catalog_index};

/// Largest integer a JSON number carries exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Which prediction model a submission targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// ICU mortality model.
    #[default]
    Primary,
    /// Length-of-stay model.
    Los,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Primary, Tab::Los];

    /// Request path on the prediction service.
    pub fn endpoint(self) -> &'static str {
        match self {
            Tab::Primary => "/predict",
            Tab::Los => "/predict-los",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Tab::Primary => "ICU Mortality",
            Tab::Los => "LOS Model",
        }
    }

    pub fn next(self) -> Tab {
        match self {
            Tab::Primary => Tab::Los,
            Tab::Los => Tab::Primary,
        }
    }
}

/// A single feature value: free text for categorical features, a number otherwise.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            FeatureValue::Number(_) => None,
        }
    }
}

fn whole_number(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER {
        Some(v as i64)
    } else {
        None
    }
}

// Whole numbers go out as JSON integers, matching what a browser would send.
impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Text(s) => serializer.serialize_str(s),
            FeatureValue::Number(v) => match whole_number(*v) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*v),
            },
        }
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Text(s) => write!(f, "{s}"),
            FeatureValue::Number(v) => match whole_number(*v) {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "{v}"),
            },
        }
    }
}

/// The full set of clinical inputs, one value per catalog entry.
///
/// Values are stored positionally against [`CATALOG`], so the key set is fixed
/// for the lifetime of the value: keys can be looked up and their values
/// replaced, but never added or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    values: Vec<FeatureValue>,
}

impl FeatureSet {
    /// Build from values in catalog order.
    pub(crate) fn from_values(values: Vec<FeatureValue>) -> Self {
        debug_assert_eq!(values.len(), CATALOG.len());
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&FeatureValue> {
        catalog_index(key).and_then(|idx| self.values.get(idx))
    }

    /// Replace the value for `key`, returning the previous one.
    ///
    /// Returns `None` (and leaves the set untouched) for keys outside the catalog.
    pub fn replace(&mut self, key: &str, value: FeatureValue) -> Option<FeatureValue> {
        let idx = catalog_index(key)?;
        let slot = self.values.get_mut(idx)?;
        Some(std::mem::replace(slot, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        CATALOG.iter().take(self.values.len()).map(|spec| spec.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static FeatureSpec, &FeatureValue)> + '_ {
        CATALOG.iter().zip(self.values.iter())
    }
}

impl Serialize for FeatureSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (spec, value) in self.iter() {
            map.serialize_entry(spec.name, value)?;
        }
        map.end()
    }
}

/// JSON body for both prediction endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest<'a> {
    pub features: &'a FeatureSet,
}

/// Model metadata optionally echoed by the service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Successful reply from a prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Opaque display value (label, number, or anything else the model returns).
    pub prediction: serde_json::Value,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
}

impl PredictionResult {
    /// The prediction as display text: strings verbatim, anything else as JSON.
    pub fn prediction_text(&self) -> String {
        match &self.prediction {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Confidence as a one-decimal percentage (`0.87` → `"87.0%"`).
    ///
    /// Absent and zero confidences both render as nothing.
    pub fn confidence_percent(&self) -> Option<String> {
        match self.confidence {
            Some(c) if c != 0.0 && c.is_finite() => Some(format!("{:.1}%", c * 100.0)),
            _ => None,
        }
    }

    pub fn model_type(&self) -> Option<&str> {
        self.model_info.as_ref().and_then(|info| info.kind.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureGenerator;

    #[test]
    fn whole_numbers_serialize_as_integers() {
        let json = serde_json::to_string(&FeatureValue::Number(42.0)).unwrap();
        assert_eq!(json, "42");
        let json = serde_json::to_string(&FeatureValue::Number(36.6)).unwrap();
        assert_eq!(json, "36.6");
        let json = serde_json::to_string(&FeatureValue::Text("SELF PAY".into())).unwrap();
        assert_eq!(json, "\"SELF PAY\"");
    }

    #[test]
    fn feature_set_serializes_in_catalog_order() {
        let features = FeatureGenerator::from_seed(7).generate();
        let body = serde_json::to_value(PredictionRequest { features: &features }).unwrap();
        let object = body["features"].as_object().unwrap();
        assert_eq!(object.len(), 57);
        let json = serde_json::to_string(&features).unwrap();
        assert!(json.starts_with("{\"gender\":"));
    }

    #[test]
    fn replace_rejects_unknown_keys() {
        let mut features = FeatureGenerator::from_seed(1).generate();
        let before = features.clone();
        assert!(features.replace("not_a_feature", FeatureValue::Number(1.0)).is_none());
        assert_eq!(features, before);

        let old = features.replace("mbp_min", FeatureValue::Number(55.0));
        assert!(old.is_some());
        assert_eq!(features.get("mbp_min"), Some(&FeatureValue::Number(55.0)));
    }

    #[test]
    fn prediction_result_parses_optional_fields() {
        let r: PredictionResult =
            serde_json::from_str(r#"{"prediction":"survived","confidence":0.87}"#).unwrap();
        assert_eq!(r.prediction_text(), "survived");
        assert_eq!(r.confidence_percent().as_deref(), Some("87.0%"));
        assert_eq!(r.model_type(), None);

        let r: PredictionResult = serde_json::from_str(
            r#"{"prediction":4.5,"confidence":0,"model_info":{"type":"xgboost"}}"#,
        )
        .unwrap();
        assert_eq!(r.prediction_text(), "4.5");
        assert_eq!(r.confidence_percent(), None);
        assert_eq!(r.model_type(), Some("xgboost"));
    }

    #[test]
    fn prediction_is_required() {
        let r = serde_json::from_str::<PredictionResult>(r#"{"confidence":0.5}"#);
        assert!(r.is_err());
    }

    #[test]
    fn tabs_map_to_endpoints() {
        assert_eq!(Tab::Primary.endpoint(), "/predict");
        assert_eq!(Tab::Los.endpoint(), "/predict-los");
        assert_eq!(Tab::Primary.next(), Tab::Los);
    }
}
