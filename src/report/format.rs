//! Formatted terminal output: prediction outcomes, feature tables, the catalog.
//!
//! Formatting lives in one place so the CLI and the TUI show the same text.

use crate::domain::FeatureSet;
use crate::features::CATALOG;
use crate::state::{CompletedPrediction, FormState};

/// Result block, one `label: value` line per field the service returned.
pub fn format_prediction(done: &CompletedPrediction) -> String {
    let mut out = String::new();
    out.push_str(&format!("Prediction Result ({})\n", done.tab.display_name()));
    out.push_str(&format!("Prediction: {}\n", done.result.prediction_text()));
    if let Some(confidence) = done.result.confidence_percent() {
        out.push_str(&format!("Confidence: {confidence}\n"));
    }
    // The row follows `model_info`; a missing `type` leaves the value blank.
    if done.result.model_info.is_some() {
        let kind = done.result.model_type().unwrap_or_default();
        out.push_str(format!("Model Type: {kind}").trim_end());
        out.push('\n');
    }
    out
}

/// Whatever the form currently shows below the inputs: progress, error, or result.
pub fn format_outcome(state: &FormState) -> String {
    if state.is_loading() {
        return "Processing your prediction...\n".to_string();
    }
    if let Some(err) = state.error() {
        return format!("Error: {err}\n");
    }
    match state.result() {
        Some(done) => format_prediction(done),
        None => String::new(),
    }
}

/// Two-column table of labels and current values.
pub fn format_features(features: &FeatureSet) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<40} {:<20}\n", "feature", "value").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<40} {:-<20}\n", "", "").trim_end());
    out.push('\n');

    for (spec, value) in features.iter() {
        out.push_str(format!("{:<40} {:<20}\n", truncate(&spec.label(), 40), value.to_string()).trim_end());
        out.push('\n');
    }

    out
}

/// Every catalog entry with its unit and generation domain.
pub fn format_catalog() -> String {
    let mut out = String::new();
    out.push_str(format!("{:<32} {:<12} {}\n", "name", "unit", "domain").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<32} {:-<12} {:-<24}\n", "", "", "").trim_end());
    out.push('\n');

    for spec in CATALOG.iter() {
        out.push_str(
            format!(
                "{:<32} {:<12} {}\n",
                truncate(spec.name, 32),
                truncate(spec.unit, 12),
                spec.domain.describe()
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
