//! In-process token ledger.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use hush_crypto::token::TokenHash;
use hush_types::SurveyId;

use crate::{ConsumeOutcome, LedgerError, Result, TokenLedger};

/// Ledger backed by a mutex-guarded set.
///
/// Atomic within one process only. Deployments with more than one instance
/// use the SQLite ledger.
#[derive(Default)]
pub struct MemoryLedger {
    used: Mutex<HashSet<(String, SurveyId)>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of redeemed entries across all surveys.
    pub fn len(&self) -> usize {
        self.used.lock().map(|set| set.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenLedger for MemoryLedger {
    async fn consume(&self, hash: &TokenHash, survey_id: SurveyId) -> Result<ConsumeOutcome> {
        let mut used = self
            .used
            .lock()
            .map_err(|_| LedgerError::Backend("ledger lock poisoned".into()))?;
        // HashSet::insert is the check and the write in one step.
        if used.insert((hash.as_str().to_string(), survey_id)) {
            Ok(ConsumeOutcome::Consumed)
        } else {
            tracing::debug!(%survey_id, "token already redeemed");
            Ok(ConsumeOutcome::AlreadyUsed)
        }
    }

    async fn is_used(&self, hash: &TokenHash, survey_id: SurveyId) -> Result<bool> {
        let used = self
            .used
            .lock()
            .map_err(|_| LedgerError::Backend("ledger lock poisoned".into()))?;
        Ok(used.contains(&(hash.as_str().to_string(), survey_id)))
    }
}
