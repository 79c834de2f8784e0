//! HTTP routes.
//!
//! Thin adapters from axum extractors to the command handlers. Bodies that
//! fail to parse become `400 {"error": ...}`.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;

use hush_types::{AggregateData, SurveyId, SurveyView};

use crate::commands::responses::{
    self, SubmitResponseRequest, SubmitResponseResult, ValidateTokenRequest, ValidateTokenResult,
};
use crate::commands::surveys::{self, CreateSurveyRequest, PublishRequest, PublishResponse};
use crate::error::{CommandError, Result};
use crate::pipeline;
use crate::state::SharedState;

/// Full application: routes wrapped in the ordered pipeline.
pub fn app(state: SharedState) -> Router {
    let routes = Router::new()
        .route("/healthz", get(healthz))
        .route("/surveys", get(list_surveys).post(create_survey))
        .route("/surveys/:id", get(get_survey))
        .route("/surveys/:id/publish", post(publish_survey))
        .route("/surveys/:id/close", post(close_survey))
        .route("/surveys/:id/responses", post(submit_response))
        .route("/surveys/:id/results", get(get_results))
        .route("/surveys/:id/validate-token", post(validate_token))
        .with_state(state.clone());
    pipeline::apply(routes, &state)
}

/// Unparsable ids cannot name a survey.
fn survey_id(raw: &str) -> Result<SurveyId> {
    raw.parse().map_err(|_| CommandError::NotFound)
}

fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(v)| v)
        .map_err(|rejection| CommandError::validation(rejection.body_text()))
}

/// Empty body means defaults.
fn optional_json_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| CommandError::validation(format!("Invalid JSON body: {e}")))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_surveys(State(state): State<SharedState>) -> Result<Json<Vec<SurveyView>>> {
    surveys::list_surveys(&state).await.map(Json)
}

async fn create_survey(
    State(state): State<SharedState>,
    body: std::result::Result<Json<CreateSurveyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SurveyView>)> {
    let req = json_body(body)?;
    let view = surveys::create_survey(&state, req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_survey(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SurveyView>> {
    surveys::get_survey(&state, survey_id(&id)?).await.map(Json)
}

async fn publish_survey(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<PublishResponse>> {
    let id = survey_id(&id)?;
    let req: PublishRequest = optional_json_body(&body)?;
    surveys::publish_survey(&state, id, req).await.map(Json)
}

async fn close_survey(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SurveyView>> {
    surveys::close_survey(&state, survey_id(&id)?).await.map(Json)
}

async fn submit_response(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<SubmitResponseRequest>, JsonRejection>,
) -> Result<Json<SubmitResponseResult>> {
    let id = survey_id(&id)?;
    let req = json_body(body)?;
    responses::submit_response(&state, id, req).await.map(Json)
}

async fn get_results(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<AggregateData>> {
    responses::get_results(&state, survey_id(&id)?).await.map(Json)
}

async fn validate_token(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<ValidateTokenRequest>, JsonRejection>,
) -> Result<Json<ValidateTokenResult>> {
    let req = json_body(body)?;
    let Ok(id) = id.parse::<SurveyId>() else {
        return Ok(Json(ValidateTokenResult {
            valid: false,
            error: Some(CommandError::NotFound.public_message()),
        }));
    };
    responses::validate_token_for(&state, id, req).await.map(Json)
}
