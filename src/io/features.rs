//! Read/write FeatureSet JSON files.
//!
//! Files use the request body shape, `{ "features": { ... } }`, so a saved
//! file can be replayed with `curl` as-is. Reading also accepts a bare object
//! of feature values.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};

use crate::domain::{FeatureSet, FeatureValue, PredictionRequest};
use crate::error::AppError;
use crate::features::{CATALOG, catalog_index};

/// Write `features` as pretty JSON in request-body shape.
pub fn write_features_json(path: &Path, features: &FeatureSet) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create feature file '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(&mut file, &PredictionRequest { features })
        .map_err(|e| AppError::usage(format!("Failed to write feature file: {e}")))?;
    writeln!(file).map_err(|e| AppError::usage(format!("Failed to write feature file: {e}")))?;
    Ok(())
}

/// Read a feature file written by [`write_features_json`] (or a bare object).
pub fn read_features_json(path: &Path) -> Result<FeatureSet, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open feature file '{}': {e}", path.display())))?;
    let value: Value = serde_json::from_reader(file)
        .map_err(|e| AppError::usage(format!("Invalid feature JSON in '{}': {e}", path.display())))?;
    features_from_value(value)
}

/// Validate a JSON document into a FeatureSet.
///
/// Every catalog key must be present, no other keys are allowed, and values
/// must be strings or numbers.
pub fn features_from_value(value: Value) -> Result<FeatureSet, AppError> {
    let mut object = match value {
        Value::Object(object) => object,
        _ => return Err(AppError::usage("Feature file must contain a JSON object.")),
    };
    let object = match object.remove("features") {
        Some(Value::Object(inner)) if object.is_empty() => inner,
        Some(_) => {
            return Err(AppError::usage(
                "Expected `features` to be the only top-level key, holding an object.",
            ));
        }
        None => object,
    };

    let unknown: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|key| catalog_index(key).is_none())
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::usage(format!("Unknown feature(s): {}.", unknown.join(", "))));
    }

    let missing: Vec<&str> = CATALOG
        .iter()
        .map(|spec| spec.name)
        .filter(|name| !object.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::usage(format!("Missing feature(s): {}.", missing.join(", "))));
    }

    let values = CATALOG
        .iter()
        .map(|spec| feature_value(spec.name, &object))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FeatureSet::from_values(values))
}

fn feature_value(name: &str, object: &Map<String, Value>) -> Result<FeatureValue, AppError> {
    match object.get(name) {
        Some(Value::String(s)) => Ok(FeatureValue::Text(s.clone())),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(FeatureValue::Number)
            .ok_or_else(|| AppError::usage(format!("Feature '{name}' is not a representable number."))),
        Some(other) => Err(AppError::usage(format!(
            "Feature '{name}' must be a string or number, got {other}."
        ))),
        None => Err(AppError::usage(format!("Missing feature: {name}."))),
    }
}
