//! Debug bundle writer for reproducing a form submission by hand.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::api::ApiConfig;
use crate::domain::PredictionRequest;
use crate::error::AppError;
use crate::state::FormState;

/// Write a markdown bundle under `debug/` and return its path.
pub fn write_debug_bundle(state: &FormState, config: &ApiConfig) -> Result<PathBuf, AppError> {
    write_debug_bundle_in(Path::new("debug"), state, config)
}

pub fn write_debug_bundle_in(dir: &Path, state: &FormState, config: &ApiConfig) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::runtime(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("model_tester_debug_{ts}.md"));

    let mut file = File::create(&path)
        .map_err(|e| AppError::runtime(format!("Failed to create debug file: {e}")))?;
    file.write_all(render_bundle(state, config)?.as_bytes())
        .map_err(|e| AppError::runtime(format!("Failed to write debug bundle: {e}")))?;

    Ok(path)
}

fn render_bundle(state: &FormState, config: &ApiConfig) -> Result<String, AppError> {
    let tab = state.active_tab();
    let body = serde_json::to_string_pretty(&PredictionRequest {
        features: state.features(),
    })
    .map_err(|e| AppError::runtime(format!("Failed to serialize request body: {e}")))?;

    let mut out = String::new();
    out.push_str("# model-tester debug bundle\n");
    out.push_str(&format!("- generated: {}\n", Local::now().to_rfc3339()));
    out.push_str(&format!("- base_url: {}\n", config.base_url()));
    out.push_str(&format!("- tab: {} ({})\n", tab.display_name(), tab.endpoint()));
    out.push_str(&format!("- loading: {}\n", state.is_loading()));
    if let Some(token) = state.pending_token() {
        out.push_str(&format!("- pending: {token}\n"));
    }

    out.push_str("\n## Last outcome\n");
    match (state.error(), state.result()) {
        (Some(err), _) => out.push_str(&format!("error: {err}\n")),
        (None, Some(done)) => out.push_str(&crate::report::format_prediction(done)),
        (None, None) => out.push_str("-\n"),
    }

    out.push_str("\n## Request\n");
    out.push_str(&format!("POST {}\n\n", config.url(tab.endpoint())));
    out.push_str("```json\n");
    out.push_str(&body);
    out.push_str("\n```\n");

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tab;
    use crate::features::FeatureGenerator;
    use tempfile::tempdir;

    #[test]
    fn bundle_contains_endpoint_and_body() {
        let dir = tempdir().unwrap();
        let state = FormState::new(FeatureGenerator::from_seed(4).generate()).with_tab(Tab::Los);
        let config = ApiConfig::new("http://models.internal:8000/");

        let path = write_debug_bundle_in(dir.path(), &state, &config).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("POST http://models.internal:8000/predict-los"));
        assert!(text.contains("\"features\""));
        assert!(text.contains("\"charlson_comorbidity_index\""));
        assert!(text.contains("## Last outcome\n-\n"));
    }
}
