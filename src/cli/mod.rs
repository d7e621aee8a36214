//! Command-line parsing for the model tester.
//!
//! Parsing lives here; dispatch lives in `crate::app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::Tab;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "model-tester",
    version,
    about = "Fill in clinical features and test them against ICU prediction models"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive form (default when no subcommand is given).
    Tui(TuiArgs),
    /// Print (or save) a randomly generated FeatureSet.
    Generate(GenerateArgs),
    /// Submit a FeatureSet to a model endpoint and print the outcome.
    Predict(PredictArgs),
    /// Query the backend health endpoint.
    Health(ApiArgs),
    /// List every feature with its unit and generation domain.
    Catalog,
}

/// Backend location, shared by every subcommand that talks HTTP.
#[derive(Debug, Args, Clone, Default)]
pub struct ApiArgs {
    /// Backend base URL (overrides MODEL_API_URL).
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Seed for the feature generator; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Model to target first.
    #[arg(long, value_enum, default_value_t = Tab::Primary)]
    pub tab: Tab,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Seed for the feature generator; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write `{ "features": ... }` JSON to this file instead of stdout.
    #[arg(long, value_name = "JSON")]
    pub out: Option<PathBuf>,

    /// Print a label/value table instead of JSON.
    #[arg(long, conflicts_with = "out")]
    pub table: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Which model endpoint to call.
    #[arg(long, value_enum, default_value_t = Tab::Primary)]
    pub tab: Tab,

    /// Seed for the feature generator (ignored with --features).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Load features from a JSON file instead of generating them.
    #[arg(long, value_name = "JSON")]
    pub features: Option<PathBuf>,

    /// Override one feature before submitting; repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,
}

/// Parse `key=value`. The value may be empty; the key may not.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing feature name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
