//! Ordered request pipeline.
//!
//! [`PIPELINE`] lists every middleware stage outermost first. The anonymity
//! filter is always first so that no later stage observes stripped metadata.

use std::time::Duration;

use axum::{middleware, Router};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::state::SharedState;
use crate::{anonymity, auth};

/// One middleware stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    AnonymityFilter,
    RequestTimeout,
    Trace,
    AdminGuard,
}

/// Stages in request order, outermost first. Handlers run after the last.
pub const PIPELINE: [Stage; 4] = [
    Stage::AnonymityFilter,
    Stage::RequestTimeout,
    Stage::Trace,
    Stage::AdminGuard,
];

/// Wrap `router` in every stage of [`PIPELINE`].
///
/// `Router::layer` makes each new layer the outermost, so stages are applied
/// innermost first.
pub fn apply(router: Router, state: &SharedState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    PIPELINE.iter().rev().fold(router, |router, stage| match stage {
        Stage::AnonymityFilter => router.layer(middleware::from_fn(anonymity::anonymity_filter)),
        Stage::RequestTimeout => router.layer(TimeoutLayer::new(timeout)),
        Stage::Trace => router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new().include_headers(false)),
        ),
        Stage::AdminGuard => router.layer(middleware::from_fn_with_state(
            state.clone(),
            auth::admin_guard,
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymity_filter_is_first() {
        assert_eq!(PIPELINE.first(), Some(&Stage::AnonymityFilter));
        assert_eq!(
            PIPELINE.iter().filter(|s| **s == Stage::AnonymityFilter).count(),
            1
        );
    }

    #[test]
    fn test_admin_guard_after_filter() {
        let position = |stage| PIPELINE.iter().position(|s| *s == stage);
        assert!(position(Stage::AnonymityFilter) < position(Stage::AdminGuard));
        assert!(position(Stage::Trace) < position(Stage::AdminGuard));
    }
}
