//! # hush-server
//!
//! HTTP service for anonymous surveys.
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration with environment overrides
//! - [`state`]: shared stores, ledger and protector
//! - [`commands`]: survey lifecycle and respondent command handlers
//! - [`routes`]: axum routes over the command handlers
//! - [`pipeline`]: ordered middleware chain, anonymity filter first
//! - [`anonymity`]: respondent-route metadata stripping
//! - [`auth`]: admin API-key guard
//! - [`error`]: command error taxonomy and HTTP mapping
//! - [`keystore`]: master key for the local secret protector

pub mod anonymity;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod keystore;
pub mod pipeline;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::HushConfig;
pub use routes::app;
pub use state::{AppState, SharedState};
