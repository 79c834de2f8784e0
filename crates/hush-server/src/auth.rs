//! Admin API-key guard.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::CommandError;
use crate::state::SharedState;

/// Header carrying the admin key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Whether a path is admin-only: the survey collection, or `publish`/`close`
/// on a survey. Classification ignores the method, so `HEAD` and friends are
/// guarded exactly like `GET` and `POST`.
pub fn is_admin_route(path: &str) -> bool {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&"api") {
        segments.remove(0);
    }
    matches!(
        segments.as_slice(),
        ["surveys"] | ["surveys", _, "publish" | "close"]
    )
}

fn key_matches(presented: &[u8], expected: &[u8]) -> bool {
    presented.ct_eq(expected).into()
}

/// Rejects admin requests without the configured key. With no key
/// configured every request passes.
pub async fn admin_guard(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let expected = state.config.auth.api_key.as_bytes();
    if expected.is_empty() || !is_admin_route(req.uri().path()) {
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();
    if !key_matches(presented, expected) {
        tracing::warn!(method = %req.method(), path = %req.uri().path(), "admin request rejected");
        return CommandError::Unauthorized.into_response();
    }
    next.run(req).await
}
