//! Survey lifecycle command handlers.

use serde::{Deserialize, Serialize};

use hush_crypto::jitter::now_unix;
use hush_crypto::token::{generate_batch_secret, generate_tokens};
use hush_types::{
    ProtectedSecret, Question, QuestionId, QuestionType, Survey, SurveyId, SurveyStatus,
    SurveyView,
};

use super::unprotect_secret;
use crate::error::{CommandError, Result};
use crate::state::AppState;

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 2000;
const MAX_THRESHOLD: u32 = 1000;
const MAX_JITTER_MINUTES: u32 = 1440;
const MAX_QUESTIONS: usize = 100;
const MAX_QUESTION_TEXT_CHARS: usize = 1000;
const MAX_OPTIONS: usize = 50;
const MAX_OPTION_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub anonymity_threshold: Option<u32>,
    pub timestamp_jitter_minutes: Option<u32>,
    #[serde(default)]
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    pub order: Option<i32>,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub token_count: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub survey_id: SurveyId,
    pub shareable_link: String,
    pub tokens: Vec<String>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn validate_create(req: &CreateSurveyRequest, threshold: u32, jitter: u32) -> Result<()> {
    let title_len = char_len(req.title.trim());
    if title_len == 0 || title_len > MAX_TITLE_CHARS {
        return Err(CommandError::validation(format!(
            "Title must be between 1 and {MAX_TITLE_CHARS} characters"
        )));
    }
    if char_len(&req.description) > MAX_DESCRIPTION_CHARS {
        return Err(CommandError::validation(format!(
            "Description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    if threshold == 0 || threshold > MAX_THRESHOLD {
        return Err(CommandError::validation(format!(
            "Anonymity threshold must be between 1 and {MAX_THRESHOLD}"
        )));
    }
    if jitter > MAX_JITTER_MINUTES {
        return Err(CommandError::validation(format!(
            "Timestamp jitter must be between 0 and {MAX_JITTER_MINUTES} minutes"
        )));
    }
    if req.questions.is_empty() || req.questions.len() > MAX_QUESTIONS {
        return Err(CommandError::validation(format!(
            "A survey needs between 1 and {MAX_QUESTIONS} questions"
        )));
    }
    for q in &req.questions {
        let text_len = char_len(q.text.trim());
        if text_len == 0 || text_len > MAX_QUESTION_TEXT_CHARS {
            return Err(CommandError::validation(format!(
                "Question text must be between 1 and {MAX_QUESTION_TEXT_CHARS} characters"
            )));
        }
        if q.options.len() > MAX_OPTIONS {
            return Err(CommandError::validation(format!(
                "A question may have at most {MAX_OPTIONS} options"
            )));
        }
        if q.options.iter().any(|o| char_len(o) > MAX_OPTION_CHARS) {
            return Err(CommandError::validation(format!(
                "Options must be at most {MAX_OPTION_CHARS} characters"
            )));
        }
    }
    Ok(())
}

fn build_questions(requests: Vec<CreateQuestionRequest>) -> Result<Vec<Question>> {
    requests
        .into_iter()
        .enumerate()
        .map(|(index, q)| {
            let kind: QuestionType = q
                .kind
                .parse()
                .map_err(|_| CommandError::validation(format!("Unknown question type '{}'", q.kind)))?;
            Ok(Question {
                id: QuestionId::generate(),
                kind,
                text: q.text.trim().to_string(),
                options: q.options,
                required: q.required,
                order: q.order.unwrap_or(index as i32),
            })
        })
        .collect()
}

/// Create a draft survey with a fresh, protected batch secret.
pub async fn create_survey(state: &AppState, req: CreateSurveyRequest) -> Result<SurveyView> {
    let defaults = &state.config.anonymity;
    let threshold = req.anonymity_threshold.unwrap_or(defaults.default_threshold);
    let jitter = req
        .timestamp_jitter_minutes
        .unwrap_or(defaults.default_jitter_minutes);
    validate_create(&req, threshold, jitter)?;

    let secret = generate_batch_secret();
    let envelope = state.protector.protect(secret.as_bytes()).await?;

    let survey = Survey {
        id: SurveyId::generate(),
        title: req.title.trim().to_string(),
        description: req.description,
        status: SurveyStatus::Draft,
        anonymity_threshold: threshold,
        jitter_minutes: jitter,
        protected_secret: ProtectedSecret::new(envelope),
        created_at: now_unix(),
        questions: build_questions(req.questions)?,
    };
    state.surveys.insert_survey(&survey).await?;

    tracing::info!(
        survey_id = %survey.id,
        questions = survey.questions.len(),
        threshold,
        "survey created"
    );
    Ok(survey.view())
}

/// All surveys, newest first, without questions.
pub async fn list_surveys(state: &AppState) -> Result<Vec<SurveyView>> {
    let surveys = state.surveys.list_surveys().await?;
    Ok(surveys.iter().map(Survey::summary).collect())
}

/// One survey with its questions in declared order.
pub async fn get_survey(state: &AppState, id: SurveyId) -> Result<SurveyView> {
    let survey = state
        .surveys
        .get_survey(id)
        .await?
        .ok_or(CommandError::NotFound)?;
    Ok(survey.view())
}

/// Activate a survey and mint a batch of tokens.
///
/// Publishing an active survey again mints more tokens under the same
/// secret. A closed survey cannot be republished.
pub async fn publish_survey(
    state: &AppState,
    id: SurveyId,
    req: PublishRequest,
) -> Result<PublishResponse> {
    let limits = &state.config.anonymity;
    let count = req.token_count.unwrap_or(limits.default_token_count);
    if count == 0 || count > limits.max_tokens_per_publish {
        return Err(CommandError::validation(format!(
            "Token count must be between 1 and {}",
            limits.max_tokens_per_publish
        )));
    }

    let survey = state
        .surveys
        .get_survey(id)
        .await?
        .ok_or(CommandError::NotFound)?;
    if survey.status == SurveyStatus::Closed {
        return Err(CommandError::InactiveSurvey);
    }

    let secret = unprotect_secret(state, &survey).await?;
    let tokens = generate_tokens(&secret, count as usize)?;

    // Closing may have landed since the read above.
    if !state.surveys.activate_survey(id).await? {
        return Err(CommandError::InactiveSurvey);
    }

    tracing::info!(survey_id = %id, tokens = tokens.len(), "survey published");
    Ok(PublishResponse {
        survey_id: id,
        shareable_link: shareable_link(&state.config.server.public_base_url, id),
        tokens,
    })
}

/// Close a survey. Further submissions are rejected.
pub async fn close_survey(state: &AppState, id: SurveyId) -> Result<SurveyView> {
    if !state.surveys.set_status(id, SurveyStatus::Closed).await? {
        return Err(CommandError::NotFound);
    }
    tracing::info!(survey_id = %id, "survey closed");
    get_survey(state, id).await
}

pub fn shareable_link(base: &str, id: SurveyId) -> String {
    format!("{}/survey/{id}", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use hush_crypto::protector::{BatchSecretProtector, LocalSecretProtector};
    use hush_db::SqliteStore;
    use hush_types::{StoreResult, SurveyStore};

    use super::*;
    use crate::testutil::{create_request, test_config, test_state};

    #[tokio::test]
    async fn test_create_returns_draft_view() {
        let state = test_state();
        let view = create_survey(&state, create_request(3)).await.expect("create");

        assert_eq!(view.status, SurveyStatus::Draft);
        assert_eq!(view.anonymity_threshold, 3);
        assert_eq!(view.questions.len(), 3);
        assert_eq!(view.questions[0].kind, QuestionType::MultipleChoice);

        let stored = state.surveys.get_survey(view.id).await.expect("get").expect("present");
        assert!(!stored.protected_secret.envelope().is_empty());
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let state = test_state();
        let mut req = create_request(1);
        req.anonymity_threshold = None;
        req.timestamp_jitter_minutes = None;
        let view = create_survey(&state, req).await.expect("create");
        assert_eq!(view.anonymity_threshold, 5);
        assert_eq!(view.timestamp_jitter_minutes, 10);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let state = test_state();

        let mut req = create_request(1);
        req.title = "   ".into();
        assert!(matches!(create_survey(&state, req).await, Err(CommandError::Validation(_))));

        let mut req = create_request(1);
        req.anonymity_threshold = Some(0);
        assert!(matches!(create_survey(&state, req).await, Err(CommandError::Validation(_))));

        let mut req = create_request(1);
        req.questions.clear();
        assert!(matches!(create_survey(&state, req).await, Err(CommandError::Validation(_))));

        let mut req = create_request(1);
        req.questions[0].kind = "Slider".into();
        assert!(matches!(create_survey(&state, req).await, Err(CommandError::Validation(_))));
    }

    #[tokio::test]
    async fn test_publish_mints_tokens_and_activates() {
        let state = test_state();
        let view = create_survey(&state, create_request(1)).await.expect("create");

        let published = publish_survey(&state, view.id, PublishRequest { token_count: Some(7) })
            .await
            .expect("publish");
        assert_eq!(published.tokens.len(), 7);
        assert_eq!(published.shareable_link, format!("https://survey.test/survey/{}", view.id));

        let unique: std::collections::HashSet<_> = published.tokens.iter().collect();
        assert_eq!(unique.len(), 7);

        let stored = get_survey(&state, view.id).await.expect("get");
        assert_eq!(stored.status, SurveyStatus::Active);
    }

    #[tokio::test]
    async fn test_publish_limits() {
        let state = test_state();
        let view = create_survey(&state, create_request(1)).await.expect("create");

        for count in [0, 10_001] {
            let err = publish_survey(&state, view.id, PublishRequest { token_count: Some(count) })
                .await
                .expect_err("out of range");
            assert!(matches!(err, CommandError::Validation(_)));
        }

        let default = publish_survey(&state, view.id, PublishRequest::default())
            .await
            .expect("publish");
        assert_eq!(default.tokens.len(), 100);
    }

    #[tokio::test]
    async fn test_publish_missing_and_closed() {
        let state = test_state();
        let err = publish_survey(&state, SurveyId::generate(), PublishRequest::default())
            .await
            .expect_err("missing");
        assert!(matches!(err, CommandError::NotFound));

        let view = create_survey(&state, create_request(1)).await.expect("create");
        close_survey(&state, view.id).await.expect("close");
        let err = publish_survey(&state, view.id, PublishRequest::default())
            .await
            .expect_err("closed");
        assert!(matches!(err, CommandError::InactiveSurvey));
    }

    #[tokio::test]
    async fn test_list_summaries() {
        let state = test_state();
        create_survey(&state, create_request(2)).await.expect("create");
        let all = list_surveys(&state).await.expect("list");
        assert_eq!(all.len(), 1);
        assert!(all[0].questions.is_empty());
    }

    /// Closes every survey it hands out, as a concurrent close would.
    struct CloseAfterRead {
        inner: Arc<SqliteStore>,
    }

    #[async_trait]
    impl SurveyStore for CloseAfterRead {
        async fn insert_survey(&self, survey: &Survey) -> StoreResult<()> {
            self.inner.insert_survey(survey).await
        }

        async fn get_survey(&self, id: SurveyId) -> StoreResult<Option<Survey>> {
            let found = self.inner.get_survey(id).await?;
            self.inner.set_status(id, SurveyStatus::Closed).await?;
            Ok(found)
        }

        async fn list_surveys(&self) -> StoreResult<Vec<Survey>> {
            self.inner.list_surveys().await
        }

        async fn set_status(&self, id: SurveyId, status: SurveyStatus) -> StoreResult<bool> {
            self.inner.set_status(id, status).await
        }

        async fn activate_survey(&self, id: SurveyId) -> StoreResult<bool> {
            self.inner.activate_survey(id).await
        }
    }

    #[tokio::test]
    async fn test_publish_does_not_reopen_survey_closed_mid_flight() {
        let store = Arc::new(SqliteStore::new(hush_db::open_memory().expect("open db")));
        let key = LocalSecretProtector::generate_master_key();
        let protector: Arc<dyn BatchSecretProtector> = Arc::new(LocalSecretProtector::new(*key));
        let racing = AppState {
            surveys: Arc::new(CloseAfterRead {
                inner: store.clone(),
            }),
            responses: store.clone(),
            ledger: store.clone(),
            protector,
            config: test_config(),
        };

        let view = create_survey(&racing, create_request(1)).await.expect("create");
        let err = publish_survey(&racing, view.id, PublishRequest::default())
            .await
            .expect_err("closed during publish");
        assert!(matches!(err, CommandError::InactiveSurvey));

        let stored = store.get_survey(view.id).await.expect("get").expect("present");
        assert_eq!(stored.status, SurveyStatus::Closed);
    }

    #[test]
    fn test_shareable_link_trims_slash() {
        let id = SurveyId::from_bytes([1; 16]);
        assert_eq!(
            shareable_link("https://x.test/", id),
            format!("https://x.test/survey/{id}")
        );
        assert_eq!(shareable_link("", id), format!("/survey/{id}"));
    }
}
