//! Form state and its transitions.
//!
//! `FormState` owns the FeatureSet and the observable UI state (active tab,
//! loading flag, result, error). Transitions never perform I/O: `submit`
//! returns a [`PredictRequest`] describing the call to make, and whoever runs
//! it reports back through [`FormState::complete`]. That keeps the state
//! machine deterministic under test and lets the TUI run requests off-thread.
//!
//! Every submission is stamped with a fresh [`RequestToken`]. Only the
//! completion carrying the latest token is applied; anything older is stale
//! and dropped, so overlapping submissions cannot overwrite a newer outcome.

use tracing::{info, warn};

use crate::api::PredictError;
use crate::domain::{FeatureSet, FeatureValue, PredictionResult, Tab};
use crate::error::AppError;
use crate::features::{FeatureGenerator, lookup};

pub mod input;

pub use input::parse_numeric_input;

/// Identifies one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side effect requested by [`FormState::submit`]: one POST of `features` to
/// the endpoint for `tab`.
#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub token: RequestToken,
    pub tab: Tab,
    pub features: FeatureSet,
}

/// A result together with the tab whose endpoint produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedPrediction {
    pub tab: Tab,
    pub result: PredictionResult,
}

/// What [`FormState::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// Superseded by a later submission (or nothing was pending); state untouched.
    Stale,
}

#[derive(Debug, Clone)]
pub struct FormState {
    features: FeatureSet,
    active_tab: Tab,
    loading: bool,
    result: Option<CompletedPrediction>,
    error: Option<String>,
    next_token: u64,
    pending: Option<(RequestToken, Tab)>,
}

impl FormState {
    pub fn new(features: FeatureSet) -> Self {
        Self {
            features,
            active_tab: Tab::default(),
            loading: false,
            result: None,
            error: None,
            next_token: 1,
            pending: None,
        }
    }

    pub fn with_tab(mut self, tab: Tab) -> Self {
        self.active_tab = tab;
        self
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&CompletedPrediction> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Token of the submission whose completion would be applied next.
    pub fn pending_token(&self) -> Option<RequestToken> {
        self.pending.map(|(token, _)| token)
    }

    /// Replace one value from raw user input.
    ///
    /// Categorical features keep the text as typed. Numeric features are parsed
    /// leniently and anything unparseable becomes 0 (see [`parse_numeric_input`]).
    pub fn set_feature_value(&mut self, key: &str, raw: &str) -> Result<(), AppError> {
        let spec = lookup(key).ok_or_else(|| AppError::usage(format!("Unknown feature '{key}'.")))?;
        let value = if spec.domain.is_categorical() {
            FeatureValue::Text(raw.to_string())
        } else {
            FeatureValue::Number(parse_numeric_input(raw))
        };
        self.features
            .replace(key, value)
            .map(|_| ())
            .ok_or_else(|| AppError::usage(format!("Unknown feature '{key}'.")))
    }

    /// Swap in a freshly generated FeatureSet, discarding manual edits.
    pub fn regenerate(&mut self, generator: &mut FeatureGenerator) {
        self.features = generator.generate();
    }

    /// Target `tab` for later submissions. Features and any shown result stay.
    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    /// Start a submission: clear the previous outcome, mark loading, and hand
    /// back the request to execute.
    pub fn submit(&mut self) -> PredictRequest {
        let token = RequestToken(self.next_token);
        self.next_token += 1;

        if let Some((superseded, _)) = self.pending {
            info!(%superseded, %token, "Submission supersedes a pending request");
        }

        self.error = None;
        self.result = None;
        self.loading = true;
        self.pending = Some((token, self.active_tab));

        PredictRequest {
            token,
            tab: self.active_tab,
            features: self.features.clone(),
        }
    }

    /// Feed back the outcome of a request issued by [`FormState::submit`].
    pub fn complete(
        &mut self,
        token: RequestToken,
        outcome: Result<PredictionResult, PredictError>,
    ) -> Completion {
        let tab = match self.pending {
            Some((latest, tab)) if latest == token => tab,
            _ => {
                warn!(%token, latest = ?self.pending_token(), "Discarding stale prediction outcome");
                return Completion::Stale;
            }
        };

        match outcome {
            Ok(result) => {
                info!(%token, prediction = %result.prediction_text(), "Prediction received");
                self.result = Some(CompletedPrediction { tab, result });
            }
            Err(err) => {
                warn!(%token, error = %err, "Prediction failed");
                self.error = Some(err.to_string());
            }
        }
        self.loading = false;
        self.pending = None;
        Completion::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> FormState {
        FormState::new(FeatureGenerator::from_seed(21).generate())
    }

    fn survived(confidence: f64) -> PredictionResult {
        PredictionResult {
            prediction: serde_json::json!("survived"),
            confidence: Some(confidence),
            model_info: None,
        }
    }

    #[test]
    fn non_numeric_input_becomes_zero() {
        let mut state = state();
        state.set_feature_value("mbp_min", "abc").unwrap();
        assert_eq!(state.features().get("mbp_min"), Some(&FeatureValue::Number(0.0)));

        state.set_feature_value("mbp_min", "12.5").unwrap();
        assert_eq!(state.features().get("mbp_min"), Some(&FeatureValue::Number(12.5)));
    }

    #[test]
    fn categorical_input_is_free_text() {
        let mut state = state();
        state.set_feature_value("race", "PACIFIC ISLANDER").unwrap();
        assert_eq!(
            state.features().get("race"),
            Some(&FeatureValue::Text("PACIFIC ISLANDER".into()))
        );
    }

    #[test]
    fn unknown_key_is_rejected_without_changes() {
        let mut state = state();
        let before = state.features().clone();
        let err = state.set_feature_value("shoe_size", "42").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
        assert_eq!(state.features(), &before);
    }

    #[test]
    fn regenerate_keeps_keys_and_drops_edits() {
        let mut state = state();
        let mut generator = FeatureGenerator::from_seed(99);
        state.set_feature_value("age_at_admission", "500").unwrap();
        let before = state.features().clone();

        state.regenerate(&mut generator);
        assert!(before.keys().eq(state.features().keys()));
        assert_ne!(state.features(), &before);
        let age = state.features().get("age_at_admission").unwrap().as_number().unwrap();
        assert!(age <= 97.0);
    }

    #[test]
    fn select_tab_keeps_features_and_result() {
        let mut state = state();
        let request = state.submit();
        state.complete(request.token, Ok(survived(0.9)));
        let features = state.features().clone();

        state.select_tab(Tab::Los);
        assert_eq!(state.active_tab(), Tab::Los);
        assert_eq!(state.features(), &features);
        assert!(state.result().is_some());
    }

    #[test]
    fn submit_resets_outcome_and_targets_active_tab() {
        let mut state = state();
        let first = state.submit();
        state.complete(first.token, Err(PredictError::Http { status: 500, detail: None }));
        assert_eq!(state.error(), Some("HTTP 500"));

        state.select_tab(Tab::Los);
        let request = state.submit();
        assert_eq!(request.tab, Tab::Los);
        assert_eq!(request.tab.endpoint(), "/predict-los");
        assert_eq!(&request.features, state.features());
        assert!(state.is_loading());
        assert!(state.error().is_none());
        assert!(state.result().is_none());
    }

    #[test]
    fn success_sets_result_and_clears_loading() {
        let mut state = state();
        let request = state.submit();
        assert_eq!(state.complete(request.token, Ok(survived(0.87))), Completion::Applied);

        assert!(!state.is_loading());
        assert!(state.error().is_none());
        let done = state.result().unwrap();
        assert_eq!(done.tab, Tab::Primary);
        assert_eq!(done.result.confidence_percent().as_deref(), Some("87.0%"));
    }

    #[test]
    fn failure_sets_error_and_clears_loading() {
        let mut state = state();
        let request = state.submit();
        let detail = PredictError::Http {
            status: 422,
            detail: Some("missing field X".into()),
        };
        state.complete(request.token, Err(detail));

        assert!(!state.is_loading());
        assert!(state.result().is_none());
        assert_eq!(state.error(), Some("missing field X"));
    }

    #[test]
    fn later_resolving_first_submission_is_discarded() {
        let mut state = state();
        let first = state.submit();
        state.select_tab(Tab::Los);
        let second = state.submit();

        let los_result = PredictionResult {
            prediction: serde_json::json!(4.2),
            confidence: None,
            model_info: None,
        };
        assert_eq!(state.complete(second.token, Ok(los_result.clone())), Completion::Applied);
        assert!(!state.is_loading());

        // The first request settles last but no longer matches the latest token.
        assert_eq!(state.complete(first.token, Ok(survived(0.5))), Completion::Stale);
        let shown = state.result().unwrap();
        assert_eq!(shown.tab, Tab::Los);
        assert_eq!(shown.result, los_result);
        assert!(!state.is_loading());
    }

    #[test]
    fn stale_outcome_does_not_end_pending_submission() {
        let mut state = state();
        let first = state.submit();
        let second = state.submit();

        let stale = state.complete(first.token, Err(PredictError::Transport("reset".into())));
        assert_eq!(stale, Completion::Stale);
        assert!(state.is_loading());
        assert!(state.error().is_none());
        assert_eq!(state.pending_token(), Some(second.token));
    }

    #[test]
    fn duplicate_completion_is_stale() {
        let mut state = state();
        let request = state.submit();
        assert_eq!(state.complete(request.token, Ok(survived(0.1))), Completion::Applied);
        assert_eq!(
            state.complete(request.token, Err(PredictError::Transport("late".into()))),
            Completion::Stale
        );
        assert!(state.error().is_none());
    }
}
