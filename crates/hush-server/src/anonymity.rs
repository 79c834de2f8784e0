//! Transport metadata stripping for respondent routes.
//!
//! Respondent routes are the survey view and its `responses`, `results` and
//! `validate-token` children. On those routes the filter removes forwarding
//! headers, replaces the observed peer address with [`UNKNOWN_PEER`], and
//! drops any `Set-Cookie` from the response before its headers are written.
//! Admin and collection routes pass through untouched.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use axum::extract::{ConnectInfo, Request};
use axum::http::header::SET_COOKIE;
use axum::middleware::Next;
use axum::response::Response;

/// Inbound headers removed on respondent routes.
pub const STRIPPED_HEADERS: [&str; 6] = [
    "x-forwarded-for",
    "x-real-ip",
    "x-forwarded-host",
    "x-client-ip",
    "cf-connecting-ip",
    "true-client-ip",
];

/// Peer address seen by everything behind the filter.
pub const UNKNOWN_PEER: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));

const RESPONDENT_CHILDREN: [&str; 3] = ["responses", "results", "validate-token"];

/// Whether `path` is reachable by anonymous respondents.
///
/// Matches `[/api]/surveys/{id}` and `[/api]/surveys/{id}/{responses|results|validate-token}`.
pub fn is_respondent_route(path: &str) -> bool {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&"api") {
        segments.remove(0);
    }
    match segments.as_slice() {
        ["surveys", _id] => true,
        ["surveys", _id, child] => RESPONDENT_CHILDREN.contains(child),
        _ => false,
    }
}

/// Middleware entry point. Must be the outermost layer.
pub async fn anonymity_filter(mut req: Request, next: Next) -> Response {
    if !is_respondent_route(req.uri().path()) {
        return next.run(req).await;
    }

    let headers = req.headers_mut();
    for name in STRIPPED_HEADERS {
        headers.remove(name);
    }
    req.extensions_mut().insert(ConnectInfo(UNKNOWN_PEER));

    let mut response = next.run(req).await;
    // Headers are serialized only after this response is returned upward.
    response.headers_mut().remove(SET_COOKIE);
    response
}
