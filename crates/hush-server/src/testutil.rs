//! Shared fixtures for unit tests.

use std::sync::Arc;

use hush_crypto::protector::LocalSecretProtector;
use hush_db::SqliteStore;

use crate::commands::surveys::{CreateQuestionRequest, CreateSurveyRequest};
use crate::config::HushConfig;
use crate::state::{AppState, SharedState};

pub(crate) fn test_config() -> HushConfig {
    let mut config = HushConfig::default();
    config.server.public_base_url = "https://survey.test".into();
    config
}

pub(crate) fn state_with(config: HushConfig) -> SharedState {
    let store = SqliteStore::new(hush_db::open_memory().expect("open db"));
    let key = LocalSecretProtector::generate_master_key();
    AppState::with_sqlite(store, Arc::new(LocalSecretProtector::new(*key)), config)
}

pub(crate) fn test_state() -> SharedState {
    state_with(test_config())
}

fn question(kind: &str, text: &str, options: &[&str]) -> CreateQuestionRequest {
    CreateQuestionRequest {
        kind: kind.into(),
        text: text.into(),
        options: options.iter().map(|o| o.to_string()).collect(),
        required: true,
        order: None,
    }
}

/// Three questions: multiple choice (A/B/C), free text, yes/no.
pub(crate) fn create_request(threshold: u32) -> CreateSurveyRequest {
    CreateSurveyRequest {
        title: "Team health".into(),
        description: "Anonymous quarterly pulse".into(),
        anonymity_threshold: Some(threshold),
        timestamp_jitter_minutes: Some(3),
        questions: vec![
            question("MultipleChoice", "Pick one", &["A", "B", "C"]),
            question("freetext", "Anything else?", &[]),
            question("YesNo", "Would you recommend us?", &["Yes", "No"]),
        ],
    }
}
