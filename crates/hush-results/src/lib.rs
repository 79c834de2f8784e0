//! # hush-results
//!
//! Threshold-gated aggregate disclosure.
//!
//! Disclosure is all-or-nothing: below the survey's anonymity threshold the
//! caller learns only the required and current counts. Results are recomputed
//! on every request; nothing here is persisted.
//!
//! ## Modules
//!
//! - [`gate`]: threshold decision and the disclosure entry point
//! - [`aggregate`]: per-question-type aggregation

pub mod aggregate;
pub mod gate;

pub use gate::{disclose, Disclosure};

/// Error types for results computation.
#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    #[error("response store error: {0}")]
    Store(#[from] hush_types::StoreError),
}

/// Convenience result type for results computation.
pub type Result<T> = std::result::Result<T, ResultsError>;
