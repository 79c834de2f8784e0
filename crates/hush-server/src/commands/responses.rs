//! Respondent command handlers: submission, token pre-check, results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hush_crypto::jitter::{apply_jitter, now_unix};
use hush_crypto::token::{hash_token, validate_token};
use hush_ledger::ConsumeOutcome;
use hush_results::Disclosure;
use hush_types::{AggregateData, QuestionId, Survey, SurveyId, SurveyResponse};

use super::unprotect_secret;
use crate::error::{CommandError, Result};
use crate::state::AppState;

const MAX_TOKEN_CHARS: usize = 500;
const MAX_ANSWERS: usize = 100;
const MAX_ANSWER_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct SubmitResponseRequest {
    pub token: String,
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponseResult {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateTokenResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn check_token_shape(token: &str) -> Result<()> {
    if token.is_empty() || token.chars().count() > MAX_TOKEN_CHARS {
        return Err(CommandError::validation(format!(
            "Token must be between 1 and {MAX_TOKEN_CHARS} characters"
        )));
    }
    Ok(())
}

fn check_request_shape(req: &SubmitResponseRequest) -> Result<()> {
    check_token_shape(&req.token)?;
    if req.answers.is_empty() || req.answers.len() > MAX_ANSWERS {
        return Err(CommandError::validation(format!(
            "Between 1 and {MAX_ANSWERS} answers are required"
        )));
    }
    if req.answers.values().any(|a| a.chars().count() > MAX_ANSWER_CHARS) {
        return Err(CommandError::validation(format!(
            "Answers must be at most {MAX_ANSWER_CHARS} characters"
        )));
    }
    Ok(())
}

/// Map answer keys onto this survey's question ids.
fn resolve_answers(
    survey: &Survey,
    answers: BTreeMap<String, String>,
) -> Result<BTreeMap<QuestionId, String>> {
    answers
        .into_iter()
        .map(|(key, value)| {
            let id = key
                .parse::<QuestionId>()
                .ok()
                .filter(|id| survey.question(*id).is_some())
                .ok_or_else(|| CommandError::validation("Answer for unknown question"))?;
            Ok((id, value))
        })
        .collect()
}

async fn active_survey(state: &AppState, id: SurveyId) -> Result<Survey> {
    let survey = state
        .surveys
        .get_survey(id)
        .await?
        .ok_or(CommandError::NotFound)?;
    if !survey.accepts_responses() {
        return Err(CommandError::InactiveSurvey);
    }
    Ok(survey)
}

/// Redeem a token and store an anonymous response.
///
/// The token and its hash go to the ledger only. The stored response
/// carries the survey id, answers and a jittered timestamp, nothing else.
pub async fn submit_response(
    state: &AppState,
    survey_id: SurveyId,
    req: SubmitResponseRequest,
) -> Result<SubmitResponseResult> {
    check_request_shape(&req)?;
    let survey = active_survey(state, survey_id).await?;
    let answers = resolve_answers(&survey, req.answers)?;

    let secret = unprotect_secret(state, &survey).await?;
    if !validate_token(&req.token, &secret) {
        tracing::debug!(%survey_id, "submission rejected: invalid token");
        return Err(CommandError::InvalidToken);
    }

    let hash = hash_token(&req.token);
    if state.ledger.consume(&hash, survey_id).await? == ConsumeOutcome::AlreadyUsed {
        tracing::debug!(%survey_id, "submission rejected: token reused");
        return Err(CommandError::TokenAlreadyUsed);
    }

    let submitted_at = apply_jitter(now_unix(), i64::from(survey.jitter_minutes));
    let response = SurveyResponse::new(survey_id, answers, submitted_at);
    if let Err(e) = state.responses.insert_response(&response).await {
        // The token stays spent; a retry with it is rejected.
        tracing::warn!(%survey_id, "response insert failed after token redemption");
        return Err(e.into());
    }

    tracing::info!(%survey_id, "response recorded");
    Ok(SubmitResponseResult { success: true })
}

/// Read-only token pre-check. Never consumes.
///
/// Every failure is reported in-band as `valid: false` with a reason.
pub async fn validate_token_for(
    state: &AppState,
    survey_id: SurveyId,
    req: ValidateTokenRequest,
) -> Result<ValidateTokenResult> {
    match precheck(state, survey_id, &req.token).await {
        Ok(()) => Ok(ValidateTokenResult {
            valid: true,
            error: None,
        }),
        Err(CommandError::Infrastructure(detail)) => Err(CommandError::Infrastructure(detail)),
        Err(e) => Ok(ValidateTokenResult {
            valid: false,
            error: Some(e.public_message()),
        }),
    }
}

async fn precheck(state: &AppState, survey_id: SurveyId, token: &str) -> Result<()> {
    check_token_shape(token)?;
    let survey = active_survey(state, survey_id).await?;
    let secret = unprotect_secret(state, &survey).await?;
    if !validate_token(token, &secret) {
        return Err(CommandError::InvalidToken);
    }
    // Advisory only; redemption is decided by `consume`.
    if state.ledger.is_used(&hash_token(token), survey_id).await? {
        return Err(CommandError::TokenAlreadyUsed);
    }
    Ok(())
}

/// Threshold-gated aggregate results.
pub async fn get_results(state: &AppState, survey_id: SurveyId) -> Result<AggregateData> {
    let survey = state
        .surveys
        .get_survey(survey_id)
        .await?
        .ok_or(CommandError::NotFound)?;

    match hush_results::disclose(&survey, state.responses.as_ref()).await? {
        Disclosure::Disclosed(data) => Ok(data),
        Disclosure::Denied { need, have } => {
            Err(CommandError::InsufficientResponses { need, have })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hush_ledger::MemoryLedger;
    use hush_types::SurveyStatus;

    use super::*;
    use crate::commands::surveys::{close_survey, create_survey, publish_survey, PublishRequest};
    use crate::state::AppState;
    use crate::testutil::{create_request, test_state};

    struct Published {
        id: SurveyId,
        tokens: Vec<String>,
        choice: QuestionId,
        text: QuestionId,
    }

    async fn published(state: &AppState, threshold: u32, tokens: u32) -> Published {
        let view = create_survey(state, create_request(threshold)).await.expect("create");
        let out = publish_survey(state, view.id, PublishRequest { token_count: Some(tokens) })
            .await
            .expect("publish");
        Published {
            id: view.id,
            tokens: out.tokens,
            choice: view.questions[0].id,
            text: view.questions[1].id,
        }
    }

    fn answers(p: &Published, choice: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (p.choice.to_string(), choice.to_string()),
            (p.text.to_string(), format!("picked {choice}")),
        ])
    }

    fn submit_req(token: &str, answers: BTreeMap<String, String>) -> SubmitResponseRequest {
        SubmitResponseRequest {
            token: token.to_string(),
            answers,
        }
    }

    fn token_req(token: &str) -> ValidateTokenRequest {
        ValidateTokenRequest {
            token: token.to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_then_reuse_rejected() {
        let state = test_state();
        let p = published(&state, 1, 3).await;

        submit_response(&state, p.id, submit_req(&p.tokens[0], answers(&p, "A")))
            .await
            .expect("first submission");
        let err = submit_response(&state, p.id, submit_req(&p.tokens[0], answers(&p, "B")))
            .await
            .expect_err("reuse");
        assert!(matches!(err, CommandError::TokenAlreadyUsed));
        assert_eq!(state.responses.count_responses(p.id).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn test_submit_invalid_token() {
        let state = test_state();
        let p = published(&state, 1, 1).await;
        let other = published(&state, 1, 1).await;

        let err = submit_response(&state, p.id, submit_req(&other.tokens[0], answers(&p, "A")))
            .await
            .expect_err("foreign token");
        assert!(matches!(err, CommandError::InvalidToken));

        let err = submit_response(&state, p.id, submit_req("garbage", answers(&p, "A")))
            .await
            .expect_err("garbage");
        assert!(matches!(err, CommandError::InvalidToken));
    }

    #[tokio::test]
    async fn test_submit_lifecycle_errors() {
        let state = test_state();
        let one = || BTreeMap::from([("k".to_string(), "v".to_string())]);
        let err = submit_response(&state, SurveyId::generate(), submit_req("t", one()))
            .await
            .expect_err("missing");
        assert!(matches!(err, CommandError::NotFound));

        let draft = create_survey(&state, create_request(1)).await.expect("create");
        let err = submit_response(&state, draft.id, submit_req("t", one()))
            .await
            .expect_err("draft");
        assert!(matches!(err, CommandError::InactiveSurvey));

        let p = published(&state, 1, 1).await;
        close_survey(&state, p.id).await.expect("close");
        let err = submit_response(&state, p.id, submit_req(&p.tokens[0], answers(&p, "A")))
            .await
            .expect_err("closed");
        assert!(matches!(err, CommandError::InactiveSurvey));
    }

    #[tokio::test]
    async fn test_submit_shape_and_unknown_keys() {
        let state = test_state();
        let p = published(&state, 1, 1).await;

        let err = submit_response(&state, p.id, submit_req("", answers(&p, "A")))
            .await
            .expect_err("empty token");
        assert!(matches!(err, CommandError::Validation(_)));

        let err = submit_response(&state, p.id, submit_req(&p.tokens[0], BTreeMap::new()))
            .await
            .expect_err("no answers");
        assert!(matches!(err, CommandError::Validation(_)));

        let bogus = BTreeMap::from([(QuestionId::generate().to_string(), "A".to_string())]);
        let err = submit_response(&state, p.id, submit_req(&p.tokens[0], bogus))
            .await
            .expect_err("unknown key");
        assert!(matches!(err, CommandError::Validation(_)));

        // Rejected submissions never spend the token.
        submit_response(&state, p.id, submit_req(&p.tokens[0], answers(&p, "A")))
            .await
            .expect("token still usable");
    }

    #[tokio::test]
    async fn test_stored_response_is_jittered_within_window() {
        let state = test_state();
        let p = published(&state, 1, 1).await;
        let before = now_unix();
        submit_response(&state, p.id, submit_req(&p.tokens[0], answers(&p, "A")))
            .await
            .expect("submit");
        let after = now_unix();

        let stored = state.responses.snapshot_responses(p.id).await.expect("snapshot");
        assert_eq!(stored.len(), 1);
        let window = 3 * 60;
        assert!(stored[0].submitted_at + window >= before);
        assert!(stored[0].submitted_at <= after + window);
    }

    #[tokio::test]
    async fn test_validate_token_does_not_consume() {
        let state = test_state();
        let p = published(&state, 1, 2).await;

        let check = validate_token_for(&state, p.id, token_req(&p.tokens[0]))
            .await
            .expect("validate");
        assert!(check.valid);
        assert!(check.error.is_none());

        submit_response(&state, p.id, submit_req(&p.tokens[0], answers(&p, "A")))
            .await
            .expect("submit after precheck");

        let check = validate_token_for(&state, p.id, token_req(&p.tokens[0]))
            .await
            .expect("validate");
        assert!(!check.valid);
        assert_eq!(check.error.as_deref(), Some("Token already used"));

        let check = validate_token_for(&state, p.id, token_req("x.y"))
            .await
            .expect("validate");
        assert_eq!(check.error.as_deref(), Some("Invalid token"));

        let check = validate_token_for(&state, SurveyId::generate(), token_req("x.y"))
            .await
            .expect("validate");
        assert!(!check.valid);
        assert_eq!(check.error.as_deref(), Some("Survey not found"));
    }

    #[tokio::test]
    async fn test_results_gated_then_disclosed() {
        let state = test_state();
        let p = published(&state, 2, 5).await;

        submit_response(&state, p.id, submit_req(&p.tokens[0], answers(&p, "A")))
            .await
            .expect("submit 1");
        let err = get_results(&state, p.id).await.expect_err("below threshold");
        assert_eq!(err.public_message(), "Insufficient responses. Need 2, have 1.");

        submit_response(&state, p.id, submit_req(&p.tokens[1], answers(&p, "B")))
            .await
            .expect("submit 2");
        let data = get_results(&state, p.id).await.expect("results");
        assert_eq!(data.total_responses, 2);
        assert_eq!(data.questions[0].option_counts["A"], 1);
        assert_eq!(data.questions[0].option_percentages["B"], 50.0);
        assert_eq!(data.questions[1].free_text_answers.len(), 2);
    }

    #[tokio::test]
    async fn test_results_missing_survey() {
        let state = test_state();
        assert!(matches!(
            get_results(&state, SurveyId::generate()).await,
            Err(CommandError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_memory_ledger_backend() {
        let base = test_state();
        let state = AppState {
            surveys: base.surveys.clone(),
            responses: base.responses.clone(),
            ledger: Arc::new(MemoryLedger::new()),
            protector: base.protector.clone(),
            config: base.config.clone(),
        };
        let p = published(&state, 1, 1).await;
        submit_response(&state, p.id, submit_req(&p.tokens[0], answers(&p, "C")))
            .await
            .expect("submit");
        let err = submit_response(&state, p.id, submit_req(&p.tokens[0], answers(&p, "C")))
            .await
            .expect_err("reuse");
        assert!(matches!(err, CommandError::TokenAlreadyUsed));
        let survey = state.surveys.get_survey(p.id).await.expect("get").expect("present");
        assert_eq!(survey.status, SurveyStatus::Active);
    }
}
