//! Paper endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    routing::get,
};
use papershare_common::{AppError, AppResult};
use papershare_core::{CreatePaperInput, ListPapersInput, PaperResponse, PaperUpload};

use crate::{extractors::ApiQuery, middleware::AppState};

/// List papers, newest first.
async fn list_papers(
    State(state): State<AppState>,
    ApiQuery(input): ApiQuery<ListPapersInput>,
) -> AppResult<Json<Vec<PaperResponse>>> {
    let papers = state.paper_service.list(&input).await?;
    Ok(Json(papers))
}

/// Get a single paper.
async fn show_paper(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PaperResponse>> {
    let paper = state.paper_service.get(&id).await?;
    Ok(Json(paper))
}

/// Create a paper from a multipart form.
///
/// Fields: `title`, `abstract`, `author_id` and an optional `file`.
async fn create_paper(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<PaperResponse>> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut input = CreatePaperInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                input.file = Some(PaperUpload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "title" => input.title = read_text(field).await?,
            "abstract" => input.summary = Some(read_text(field).await?),
            "author_id" => input.author_id = Some(read_text(field).await?),
            _ => {}
        }
    }

    let paper = state.paper_service.create(input).await?;
    Ok(Json(paper))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_papers).post(create_paper))
        .route("/{id}", get(show_paper))
}
