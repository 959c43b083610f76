//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use papershare_common::AppResult;
use papershare_core::{CommentResponse, CreateCommentInput};

use crate::{extractors::ApiJson, middleware::AppState};

async fn list_comments(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
) -> AppResult<Json<Vec<CommentResponse>>> {
    let comments = state.comment_service.list(&paper_id).await?;
    Ok(Json(comments))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
    ApiJson(input): ApiJson<CreateCommentInput>,
) -> AppResult<Json<CommentResponse>> {
    let comment = state.comment_service.create(&paper_id, input).await?;
    Ok(Json(comment))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/comments", get(list_comments).post(create_comment))
}
