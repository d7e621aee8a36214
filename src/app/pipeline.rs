//! Shared request pipeline used by both CLI and TUI front-ends.
//!
//! `FormState::submit` only describes a request; this module carries it out,
//! either inline (one-shot CLI) or on a worker thread that reports back over a
//! channel (TUI). Both paths end in `FormState::complete`.

use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::api::{PredictError, PredictionClient};
use crate::domain::PredictionResult;
use crate::state::{Completion, FormState, PredictRequest, RequestToken};

/// A finished request, ready for `FormState::complete`.
#[derive(Debug)]
pub struct PredictionOutcome {
    pub token: RequestToken,
    pub result: Result<PredictionResult, PredictError>,
}

impl PredictionOutcome {
    pub fn apply(self, state: &mut FormState) -> Completion {
        state.complete(self.token, self.result)
    }
}

/// Perform the HTTP call a submission asked for.
pub fn execute(client: &PredictionClient, request: &PredictRequest) -> PredictionOutcome {
    PredictionOutcome {
        token: request.token,
        result: client.predict(request.tab, &request.features),
    }
}

/// Submit the current form and wait for the outcome on this thread.
pub fn submit_and_wait(state: &mut FormState, client: &PredictionClient) -> Completion {
    let request = state.submit();
    execute(client, &request).apply(state)
}

/// Run a submission on a worker thread; the outcome is sent on `tx`.
pub fn spawn_prediction(
    client: PredictionClient,
    request: PredictRequest,
    tx: Sender<PredictionOutcome>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let outcome = execute(&client, &request);
        // The receiver is gone only when the UI has already exited.
        let _ = tx.send(outcome);
    })
}

/// Fire-and-forget health probe. The reply is logged and nothing else.
pub fn spawn_health_probe(client: PredictionClient) -> JoinHandle<()> {
    thread::spawn(move || match client.health() {
        Ok(body) => info!(base_url = client.config().base_url(), %body, "Backend health check"),
        Err(err) => warn!(base_url = client.config().base_url(), error = %err, "Backend health check failed"),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier, mpsc};
    use std::time::Duration;

    use super::*;
    use crate::api::ApiConfig;
    use crate::domain::Tab;
    use crate::features::FeatureGenerator;
    use crate::report::format_outcome;
    use crate::test_support::{Route, json_response, raw_response, request_line, serve_once, serve_routes};

    fn form() -> FormState {
        FormState::new(FeatureGenerator::from_seed(31).generate())
    }

    fn client_for(base: &str) -> PredictionClient {
        PredictionClient::new(ApiConfig::new(base)).unwrap()
    }

    #[test]
    fn primary_submission_displays_prediction_and_confidence() {
        let (base, _requests) =
            serve_once(json_response("200 OK", r#"{"prediction":"survived","confidence":0.87}"#));
        let mut state = form();

        assert_eq!(submit_and_wait(&mut state, &client_for(&base)), Completion::Applied);
        let shown = format_outcome(&state);
        assert!(shown.contains("survived"), "{shown}");
        assert!(shown.contains("87.0%"), "{shown}");
        assert!(!state.is_loading());
    }

    #[test]
    fn los_submission_hits_predict_los() {
        let (base, requests) = serve_once(json_response("200 OK", r#"{"prediction":5}"#));
        let mut state = form();
        state.select_tab(Tab::Los);

        submit_and_wait(&mut state, &client_for(&base));
        let request = requests.recv().unwrap();
        let path = request_line(&request).split(' ').nth(1).unwrap().to_string();
        assert!(path.ends_with("/predict-los"));
        assert_ne!(path, "/predict");
    }

    #[test]
    fn server_detail_becomes_error_text() {
        let (base, _requests) =
            serve_once(json_response("422 Unprocessable Entity", r#"{"detail": "missing field X"}"#));
        let mut state = form();

        submit_and_wait(&mut state, &client_for(&base));
        assert_eq!(state.error(), Some("missing field X"));
        assert!(state.result().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn unparseable_failure_mentions_status() {
        let (base, _requests) = serve_once(raw_response("500 Internal Server Error", "Traceback ..."));
        let mut state = form();

        submit_and_wait(&mut state, &client_for(&base));
        assert!(state.error().unwrap().contains("500"));
        assert!(!state.is_loading());
    }

    #[test]
    fn form_stays_usable_after_failure() {
        let (base, _requests) = serve_once(raw_response("502 Bad Gateway", ""));
        let mut state = form();
        submit_and_wait(&mut state, &client_for(&base));
        assert!(state.error().is_some());

        let (base, _requests) = serve_once(json_response("200 OK", r#"{"prediction":"died"}"#));
        submit_and_wait(&mut state, &client_for(&base));
        assert!(state.error().is_none());
        assert_eq!(state.result().unwrap().result.prediction_text(), "died");
    }

    #[test]
    fn slow_first_submission_cannot_overwrite_second() {
        let release_primary = Arc::new(Barrier::new(2));
        let base = serve_routes(
            vec![
                Route {
                    path: "/predict",
                    hold: Some(release_primary.clone()),
                    response: json_response("200 OK", r#"{"prediction":"from-primary"}"#),
                },
                Route {
                    path: "/predict-los",
                    hold: None,
                    response: json_response("200 OK", r#"{"prediction":"from-los"}"#),
                },
            ],
            2,
        );
        let client = client_for(&base);
        let mut state = form();
        let (tx, rx) = mpsc::channel();

        let first = state.submit();
        let first_token = first.token;
        let slow = spawn_prediction(client.clone(), first, tx.clone());
        state.select_tab(Tab::Los);
        let second = state.submit();
        let second_token = second.token;
        let fast = spawn_prediction(client, second, tx);

        // The primary reply is held, so the LOS outcome must arrive first.
        let outcome = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.token, second_token);
        assert_eq!(outcome.apply(&mut state), Completion::Applied);

        release_primary.wait();
        let outcome = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.token, first_token);
        assert_eq!(outcome.apply(&mut state), Completion::Stale);
        slow.join().unwrap();
        fast.join().unwrap();

        let shown = state.result().unwrap();
        assert_eq!(shown.tab, Tab::Los);
        assert_eq!(shown.result.prediction_text(), "from-los");
        assert!(!state.is_loading());
    }

    #[test]
    fn failed_health_check_leaves_form_usable() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let probe = spawn_health_probe(client_for(&format!("http://127.0.0.1:{port}")));
        assert!(probe.join().is_ok());

        let (base, _requests) = serve_once(json_response("200 OK", r#"{"prediction":"survived"}"#));
        let mut state = form();
        assert_eq!(submit_and_wait(&mut state, &client_for(&base)), Completion::Applied);
        assert!(state.error().is_none());
        assert_eq!(state.result().unwrap().result.prediction_text(), "survived");
    }
}
