//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use papershare_core::{CommentService, PaperService, VoteService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub paper_service: PaperService,
    pub comment_service: CommentService,
    pub vote_service: VoteService,
}

/// Mark API responses as uncacheable; vote totals change on every submission.
pub async fn no_store(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
