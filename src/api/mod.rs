//! Prediction service integration: base-URL configuration and the HTTP client.

pub mod client;
pub mod config;

pub use client::*;
pub use config::*;
