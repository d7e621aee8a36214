//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module parses arguments, sets up logging and
//! dispatches to the subcommand handlers.

use clap::Parser;

use crate::api::PredictionClient;
use crate::cli::{ApiArgs, Command, GenerateArgs, PredictArgs, TuiArgs};
use crate::error::AppError;
use crate::features::FeatureGenerator;
use crate::logging::{self, LogTarget};
use crate::state::FormState;

pub mod pipeline;

/// Entry point for the `model-tester` binary.
pub fn run() -> Result<(), AppError> {
    // Clap needs a subcommand name; bare `model-tester` should open the form.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let target = match cli.command {
        Command::Tui(_) => LogTarget::file_from_env(),
        _ => LogTarget::Stderr,
    };
    if let Err(err) = logging::init(target) {
        eprintln!("warning: logging disabled: {err}");
    }

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Generate(args) => handle_generate(args),
        Command::Predict(args) => handle_predict(args),
        Command::Health(args) => handle_health(args),
        Command::Catalog => {
            print!("{}", crate::report::format_catalog());
            Ok(())
        }
    }
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let client = client_from_args(&args.api)?;
    crate::tui::run(client, FeatureGenerator::new(args.seed), args.tab)
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let features = FeatureGenerator::new(args.seed).generate();
    match &args.out {
        Some(path) => {
            crate::io::write_features_json(path, &features)?;
            tracing::info!(path = %path.display(), "Wrote feature file");
            println!("{}", path.display());
        }
        None if args.table => print!("{}", crate::report::format_features(&features)),
        None => {
            let body = serde_json::to_string_pretty(&crate::domain::PredictionRequest {
                features: &features,
            })
            .map_err(|e| AppError::runtime(format!("Failed to serialize features: {e}")))?;
            println!("{body}");
        }
    }
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let mut state = prepare_form(&args)?;
    let client = client_from_args(&args.api)?;

    pipeline::submit_and_wait(&mut state, &client);
    if let Some(err) = state.error() {
        return Err(AppError::runtime(format!("Error: {err}")));
    }
    print!("{}", crate::report::format_outcome(&state));
    Ok(())
}

fn handle_health(args: ApiArgs) -> Result<(), AppError> {
    let client = client_from_args(&args)?;
    let body = client.health()?;
    let text = serde_json::to_string_pretty(&body)
        .map_err(|e| AppError::runtime(format!("Failed to render health response: {e}")))?;
    println!("{text}");
    Ok(())
}

fn client_from_args(args: &ApiArgs) -> Result<PredictionClient, AppError> {
    PredictionClient::from_env(args.api_url.as_deref())
}

/// Build the form a `predict` run submits: loaded or generated features, the
/// requested tab, then every `--set` edit in order.
fn prepare_form(args: &PredictArgs) -> Result<FormState, AppError> {
    let features = match &args.features {
        Some(path) => crate::io::read_features_json(path)?,
        None => FeatureGenerator::new(args.seed).generate(),
    };
    let mut state = FormState::new(features).with_tab(args.tab);
    for (key, value) in &args.set {
        state.set_feature_value(key, value)?;
    }
    Ok(state)
}

/// Rewrite argv so `model-tester` defaults to `model-tester tui`.
///
/// Rules:
/// - `model-tester`                     -> `model-tester tui`
/// - `model-tester --seed 7 ...`        -> `model-tester tui --seed 7 ...`
/// - `model-tester --help/--version/-h` -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}
