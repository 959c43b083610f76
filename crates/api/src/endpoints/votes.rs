//! Vote endpoint.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use papershare_common::AppResult;
use papershare_core::{SubmitVoteInput, VoteTally};

use crate::{extractors::ApiJson, middleware::AppState};

/// Record, change or retract a user's vote and return the new total.
async fn submit_vote(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
    ApiJson(input): ApiJson<SubmitVoteInput>,
) -> AppResult<Json<VoteTally>> {
    let tally = state.vote_service.submit(&paper_id, input).await?;
    Ok(Json(tally))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/vote", post(submit_vote))
}
