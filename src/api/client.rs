//! Blocking HTTP client for the prediction service.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::{debug, info, warn};

use crate::api::ApiConfig;
use crate::domain::{FeatureSet, PredictionRequest, PredictionResult, Tab};
use crate::error::AppError;

/// Why a request did not produce a result.
///
/// `Display` is the exact text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictError {
    /// Non-success status; `detail` is the server's explanation when it sent one.
    Http { status: u16, detail: Option<String> },
    /// The request never got a response (connection refused, DNS, reset, ...).
    Transport(String),
    /// A success status whose body was not a usable result.
    Decode(String),
}

impl std::fmt::Display for PredictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictError::Http { detail: Some(detail), .. } => write!(f, "{detail}"),
            PredictError::Http { status, detail: None } => write!(f, "HTTP {status}"),
            PredictError::Transport(msg) | PredictError::Decode(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PredictError {}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        AppError::runtime(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: Client,
    config: ApiConfig,
}

impl PredictionClient {
    pub fn new(config: ApiConfig) -> Result<Self, AppError> {
        // No local timeout: a submission waits on the transport's own limits.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| AppError::runtime(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env(cli_override: Option<&str>) -> Result<Self, AppError> {
        Self::new(ApiConfig::from_env(cli_override))
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `GET /health`, returning the JSON body on success.
    pub fn health(&self) -> Result<serde_json::Value, PredictError> {
        let url = self.config.url("/health");
        debug!(%url, "Probing service health");
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| PredictError::Transport(e.to_string()))?;
        let resp = ensure_success(resp)?;
        let bytes = resp
            .bytes()
            .map_err(|e| PredictError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| PredictError::Decode(format!("Invalid health response: {e}")))
    }

    /// POST the full FeatureSet to the endpoint for `tab`.
    pub fn predict(&self, tab: Tab, features: &FeatureSet) -> Result<PredictionResult, PredictError> {
        let url = self.config.url(tab.endpoint());
        info!(%url, tab = tab.display_name(), "Submitting prediction request");

        let resp = self
            .client
            .post(&url)
            .json(&PredictionRequest { features })
            .send()
            .map_err(|e| PredictError::Transport(e.to_string()))?;
        let resp = ensure_success(resp)?;

        let bytes = resp
            .bytes()
            .map_err(|e| PredictError::Transport(e.to_string()))?;
        debug!(bytes = bytes.len(), "Prediction response received");
        serde_json::from_slice(&bytes)
            .map_err(|e| PredictError::Decode(format!("Invalid prediction response: {e}")))
    }
}

fn ensure_success(resp: Response) -> Result<Response, PredictError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let detail = resp.bytes().ok().and_then(|body| error_detail(&body));
    warn!(status = status.as_u16(), ?detail, "Service returned an error status");
    Err(PredictError::Http {
        status: status.as_u16(),
        detail,
    })
}

/// Pull the `detail` field out of an error body.
///
/// Strings are used verbatim; other JSON values are rendered compactly. Empty,
/// missing or unparseable details yield `None`.
fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
