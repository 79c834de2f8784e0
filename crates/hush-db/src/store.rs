//! Async store adapters over a shared SQLite connection.
//!
//! Every method takes the connection lock and runs its statements to
//! completion without awaiting in between. A caller whose future is dropped
//! either never acquired the lock or ran its statement to commit.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use hush_crypto::token::TokenHash;
use hush_ledger::{ConsumeOutcome, LedgerError, TokenLedger};
use hush_types::{
    ResponseStore, StoreError, StoreResult, Survey, SurveyId, SurveyResponse, SurveyStatus,
    SurveyStore,
};

use crate::{queries, DbError};

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Corrupt(msg) | DbError::Serialization(msg) => StoreError::Corrupt(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        LedgerError::Backend(err.to_string())
    }
}

/// SQLite-backed survey store, response store and token ledger.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Shared handle to the underlying connection.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.db)
    }
}

#[async_trait]
impl SurveyStore for SqliteStore {
    async fn insert_survey(&self, survey: &Survey) -> StoreResult<()> {
        let db = self.db.lock().await;
        Ok(queries::surveys::insert(&db, survey)?)
    }

    async fn get_survey(&self, id: SurveyId) -> StoreResult<Option<Survey>> {
        let db = self.db.lock().await;
        Ok(queries::surveys::get(&db, id)?)
    }

    async fn list_surveys(&self) -> StoreResult<Vec<Survey>> {
        let db = self.db.lock().await;
        Ok(queries::surveys::list(&db)?)
    }

    async fn set_status(&self, id: SurveyId, status: SurveyStatus) -> StoreResult<bool> {
        let db = self.db.lock().await;
        Ok(queries::surveys::set_status(&db, id, status)?)
    }

    async fn activate_survey(&self, id: SurveyId) -> StoreResult<bool> {
        let db = self.db.lock().await;
        Ok(queries::surveys::activate(&db, id)?)
    }
}

#[async_trait]
impl ResponseStore for SqliteStore {
    async fn insert_response(&self, response: &SurveyResponse) -> StoreResult<()> {
        let db = self.db.lock().await;
        Ok(queries::responses::insert(&db, response)?)
    }

    async fn count_responses(&self, survey_id: SurveyId) -> StoreResult<u64> {
        let db = self.db.lock().await;
        Ok(queries::responses::count(&db, survey_id)?)
    }

    async fn snapshot_responses(&self, survey_id: SurveyId) -> StoreResult<Vec<SurveyResponse>> {
        let db = self.db.lock().await;
        Ok(queries::responses::snapshot(&db, survey_id)?)
    }
}

#[async_trait]
impl TokenLedger for SqliteStore {
    async fn consume(
        &self,
        hash: &TokenHash,
        survey_id: SurveyId,
    ) -> hush_ledger::Result<ConsumeOutcome> {
        let db = self.db.lock().await;
        Ok(queries::used_tokens::consume(&db, hash, survey_id)?)
    }

    async fn is_used(&self, hash: &TokenHash, survey_id: SurveyId) -> hush_ledger::Result<bool> {
        let db = self.db.lock().await;
        Ok(queries::used_tokens::is_used(&db, hash, survey_id)?)
    }
}
