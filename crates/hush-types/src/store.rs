//! Storage contracts for surveys and responses.
//!
//! Implementations live in `hush-db`. The response store and the token ledger
//! (`hush-ledger`) are deliberately separate contracts: nothing in either
//! can reference the other.

use async_trait::async_trait;

use crate::id::SurveyId;
use crate::response::SurveyResponse;
use crate::survey::{Survey, SurveyStatus};

/// Storage failure. Always surfaced as an infrastructure error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Survey and question metadata.
#[async_trait]
pub trait SurveyStore: Send + Sync {
    async fn insert_survey(&self, survey: &Survey) -> StoreResult<()>;

    /// Survey with its questions, or `None`.
    async fn get_survey(&self, id: SurveyId) -> StoreResult<Option<Survey>>;

    async fn list_surveys(&self) -> StoreResult<Vec<Survey>>;

    /// Returns `false` when the survey does not exist.
    async fn set_status(&self, id: SurveyId, status: SurveyStatus) -> StoreResult<bool>;

    /// Move a survey to `Active` unless it is `Closed`, in one atomic step.
    /// Returns `false` when the survey is closed or missing.
    async fn activate_survey(&self, id: SurveyId) -> StoreResult<bool>;
}

/// Anonymous response storage. Append-only.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    async fn insert_response(&self, response: &SurveyResponse) -> StoreResult<()>;

    async fn count_responses(&self, survey_id: SurveyId) -> StoreResult<u64>;

    /// All responses for a survey, read from one consistent snapshot.
    /// Order carries no meaning.
    async fn snapshot_responses(&self, survey_id: SurveyId) -> StoreResult<Vec<SurveyResponse>>;
}
