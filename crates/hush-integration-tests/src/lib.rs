//! End-to-end harness for the survey service.
//!
//! [`TestApp`] drives the full router, middleware pipeline included, with
//! in-process requests against an in-memory SQLite database.
//!
//! ```sh
//! cargo test -p hush-integration-tests
//! ```

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use hush_crypto::protector::LocalSecretProtector;
use hush_db::SqliteStore;
use hush_server::{app, AppState, HushConfig};

/// Upper bound on response bodies read by the harness.
const MAX_BODY: usize = 4 * 1024 * 1024;

/// A status, the response headers and the parsed JSON body.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone)]
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_config(HushConfig::default())
    }

    pub fn with_config(config: HushConfig) -> Result<Self> {
        let store = SqliteStore::new(hush_db::open_memory()?);
        let key = LocalSecretProtector::generate_master_key();
        let state = AppState::with_sqlite(store, Arc::new(LocalSecretProtector::new(*key)), config);
        Ok(Self { router: app(state) })
    }

    /// Send a prepared request through the whole stack.
    pub async fn send(&self, req: Request<Body>) -> Result<Reply> {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .map_err(|e| anyhow!("router error: {e}"))?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        Ok(Reply {
            status,
            headers,
            body,
        })
    }

    pub async fn get(&self, uri: &str) -> Result<Reply> {
        self.send(Request::builder().uri(uri).body(Body::empty())?)
            .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<Reply> {
        self.send(post_request(uri, &body)?).await
    }

    /// Create and publish a survey, returning its id, question ids in
    /// declared order, and the minted tokens.
    pub async fn published_survey(
        &self,
        definition: Value,
        token_count: u32,
    ) -> Result<PublishedSurvey> {
        let created = self.post("/surveys", definition).await?;
        if created.status != StatusCode::CREATED {
            return Err(anyhow!("create failed: {} {}", created.status, created.body));
        }
        let id = str_field(&created.body, "id")?;
        let question_ids = created.body["questions"]
            .as_array()
            .context("questions missing")?
            .iter()
            .map(|q| str_field(q, "id"))
            .collect::<Result<Vec<_>>>()?;

        let published = self
            .post(
                &format!("/surveys/{id}/publish"),
                json!({ "tokenCount": token_count }),
            )
            .await?;
        if published.status != StatusCode::OK {
            return Err(anyhow!("publish failed: {} {}", published.status, published.body));
        }
        let tokens = published.body["tokens"]
            .as_array()
            .context("tokens missing")?
            .iter()
            .map(|t| t.as_str().map(str::to_string).context("token not a string"))
            .collect::<Result<Vec<_>>>()?;

        Ok(PublishedSurvey {
            id,
            question_ids,
            tokens,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PublishedSurvey {
    pub id: String,
    pub question_ids: Vec<String>,
    pub tokens: Vec<String>,
}

impl PublishedSurvey {
    pub fn responses_uri(&self) -> String {
        format!("/surveys/{}/responses", self.id)
    }

    pub fn results_uri(&self) -> String {
        format!("/surveys/{}/results", self.id)
    }

    /// Submission body answering questions positionally.
    pub fn submission(&self, token: &str, answers: &[&str]) -> Value {
        let answers: serde_json::Map<String, Value> = self
            .question_ids
            .iter()
            .zip(answers)
            .map(|(qid, a)| (qid.clone(), Value::String((*a).to_string())))
            .collect();
        json!({ "token": token, "answers": answers })
    }
}

pub fn post_request(uri: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

/// Team retrospective with one question of each common kind.
pub fn retro_survey(threshold: u32) -> Value {
    json!({
        "title": "Team retro",
        "description": "Anonymous feedback",
        "anonymityThreshold": threshold,
        "timestampJitterMinutes": 5,
        "questions": [
            {"type": "MultipleChoice", "text": "Best part?", "options": ["Pairing", "Demos", "Lunch"]},
            {"type": "Rating", "text": "Sprint rating", "options": ["1", "2", "3", "4", "5"]},
            {"type": "FreeText", "text": "Anything else?"}
        ]
    })
}

fn str_field(value: &Value, key: &str) -> Result<String> {
    value[key]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("field '{key}' missing"))
}
