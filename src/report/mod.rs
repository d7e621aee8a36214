//! Reporting utilities shared by the CLI and the TUI.

pub mod format;

pub use format::*;
