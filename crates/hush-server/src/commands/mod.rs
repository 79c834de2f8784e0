//! Command handlers.
//!
//! Each submodule implements one group of commands against [`AppState`].
//! Handlers are transport-agnostic; `routes` adapts them to HTTP.

pub mod responses;
pub mod surveys;

use hush_crypto::token::BatchSecret;
use hush_types::Survey;

use crate::error::Result;
use crate::state::AppState;

/// Recover a survey's batch secret through the protector.
pub(crate) async fn unprotect_secret(state: &AppState, survey: &Survey) -> Result<BatchSecret> {
    let plaintext = state
        .protector
        .unprotect(survey.protected_secret.envelope())
        .await?;
    Ok(BatchSecret::from_bytes(&plaintext)?)
}
