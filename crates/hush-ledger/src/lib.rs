//! # hush-ledger
//!
//! Single-use token redemption.
//!
//! The ledger records the one-way hash of every redeemed token, scoped by
//! survey. An entry carries nothing else: no timestamp, no response
//! reference. Redemption is a single atomic insert guarded by uniqueness on
//! `(token_hash, survey_id)`; a read-then-write check is never the
//! enforcement.
//!
//! ## Modules
//!
//! - [`memory`]: in-process ledger for a single instance and for tests
//!
//! The durable implementation lives in `hush-db`.

pub mod memory;

use async_trait::async_trait;
use hush_crypto::token::TokenHash;
use hush_types::SurveyId;

pub use memory::MemoryLedger;

/// Result of a redemption attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// This call inserted the entry. The token is now spent.
    Consumed,
    /// An entry already existed.
    AlreadyUsed,
}

impl ConsumeOutcome {
    pub fn is_consumed(&self) -> bool {
        matches!(self, ConsumeOutcome::Consumed)
    }
}

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The backing store failed. Nothing was committed.
    #[error("ledger backend error: {0}")]
    Backend(String),
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Used-token store.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Atomically redeem a token hash for a survey.
    ///
    /// Of any number of concurrent calls with the same arguments exactly one
    /// returns [`ConsumeOutcome::Consumed`]. A call that is dropped before
    /// completion has either committed in full or not at all.
    async fn consume(&self, hash: &TokenHash, survey_id: SurveyId) -> Result<ConsumeOutcome>;

    /// Advisory lookup. Never sufficient on its own to admit a submission.
    async fn is_used(&self, hash: &TokenHash, survey_id: SurveyId) -> Result<bool>;
}
