//! HTTP API layer for papershare.
//!
//! - **Endpoints**: papers, comments and the vote ledger
//! - **Extractors**: JSON and query extractors that answer with the
//!   `{ "error": .. }` envelope when the request cannot be parsed
//! - **Middleware**: shared application state
//!
//! Built on Axum 0.8. The binary mounts [`router`] under `/api`.

pub mod endpoints;
pub mod extractors;
pub mod middleware;

pub use endpoints::router;
pub use middleware::AppState;
