//! Shared server state.

use std::sync::Arc;

use hush_crypto::protector::BatchSecretProtector;
use hush_db::SqliteStore;
use hush_ledger::TokenLedger;
use hush_types::{ResponseStore, SurveyStore};

use crate::config::HushConfig;

/// Server-wide shared state.
///
/// Responses and the ledger are held as separate handles even when one
/// backend serves both; handlers never pass data between them.
pub struct AppState {
    pub surveys: Arc<dyn SurveyStore>,
    pub responses: Arc<dyn ResponseStore>,
    pub ledger: Arc<dyn TokenLedger>,
    pub protector: Arc<dyn BatchSecretProtector>,
    pub config: HushConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// State backed by one SQLite database.
    pub fn with_sqlite(
        store: SqliteStore,
        protector: Arc<dyn BatchSecretProtector>,
        config: HushConfig,
    ) -> SharedState {
        let store = Arc::new(store);
        Arc::new(Self {
            surveys: store.clone(),
            responses: store.clone(),
            ledger: store,
            protector,
            config,
        })
    }
}
