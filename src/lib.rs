//! `model-tester` library crate.
//!
//! The binary (`model-tester`) is a thin wrapper around this library so that:
//!
//! - form state and HTTP handling are testable without a terminal
//! - the CLI and the TUI share one submission pipeline

pub mod api;
pub mod app;
pub mod cli;
pub mod debug;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod logging;
pub mod report;
pub mod state;
pub mod tui;

#[cfg(test)]
mod test_support;
