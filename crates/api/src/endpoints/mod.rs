//! API endpoints.

mod comments;
mod health;
mod papers;
mod votes;

use axum::{Router, middleware};

use crate::middleware::{AppState, no_store};

/// Create the API router.
///
/// Votes are accepted both as `/papers/{id}/vote` and `/items/{id}/vote`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest(
            "/papers",
            papers::router()
                .merge(comments::router())
                .merge(votes::router()),
        )
        .nest("/items", votes::router())
        .layer(middleware::from_fn(no_store))
}
