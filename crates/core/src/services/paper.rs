//! Paper service.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use papershare_common::{
    AppError, AppResult, IdGenerator, StorageBackend, generate_storage_key,
};
use papershare_db::{
    entities::paper,
    repositories::{PaperListQuery, PaperRepository, VoteRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Upload extensions accepted for paper files.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "md", "txt"];

/// Characters of a text upload kept for search.
pub const RAW_CONTENT_LIMIT: usize = 200_000;

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

/// Query parameters of the paper listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListPapersInput {
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ListPapersInput {
    fn to_query(&self) -> PaperListQuery {
        PaperListQuery {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// A file received with a paper submission.
#[derive(Debug, Clone)]
pub struct PaperUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Input for creating a paper.
#[derive(Debug, Default, Validate)]
pub struct CreatePaperInput {
    #[validate(length(min = 1, max = 300, message = "title must be 1 to 300 characters"))]
    pub title: String,
    pub summary: Option<String>,
    pub author_id: Option<String>,
    pub file: Option<PaperUpload>,
}

/// Paper as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperResponse {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub summary: Option<String>,
    pub content_url: Option<String>,
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
    pub author_id: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub votes: i64,
}

impl PaperResponse {
    fn from_model(model: paper::Model, votes: i64) -> Self {
        Self {
            id: model.id,
            title: model.title,
            summary: model.summary,
            content_url: model.content_url,
            file_type: model.file_type,
            raw_content: model.raw_content,
            author_id: model.author_id,
            created_at: model.created_at,
            votes,
        }
    }
}

/// Paper service.
#[derive(Clone)]
pub struct PaperService {
    paper_repo: PaperRepository,
    vote_repo: VoteRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
    max_file_size: usize,
}

impl PaperService {
    /// Create a new paper service.
    #[must_use]
    pub fn new(
        paper_repo: PaperRepository,
        vote_repo: VoteRepository,
        storage: Arc<dyn StorageBackend>,
        max_file_size: usize,
    ) -> Self {
        Self {
            paper_repo,
            vote_repo,
            storage,
            id_gen: IdGenerator::new(),
            max_file_size,
        }
    }

    /// Newest papers first, each with its current score.
    pub async fn list(&self, input: &ListPapersInput) -> AppResult<Vec<PaperResponse>> {
        let papers = self.paper_repo.list(&input.to_query()).await?;

        let ids: Vec<String> = papers.iter().map(|p| p.id.clone()).collect();
        let sums = self.vote_repo.sum_for_papers(&ids).await?;

        Ok(papers
            .into_iter()
            .map(|p| {
                let votes = sums.get(&p.id).copied().unwrap_or(0);
                PaperResponse::from_model(p, votes)
            })
            .collect())
    }

    /// A single paper with its current score.
    pub async fn get(&self, id: &str) -> AppResult<PaperResponse> {
        let paper = self.paper_repo.get_by_id(id).await?;
        let votes = self.vote_repo.sum_for_paper(id).await?;
        Ok(PaperResponse::from_model(paper, votes))
    }

    /// Store the uploaded file, if any, and insert the paper.
    pub async fn create(&self, mut input: CreatePaperInput) -> AppResult<PaperResponse> {
        input.title = input.title.trim().to_string();
        input.validate()?;

        let file = match input.file.take() {
            Some(upload) if !upload.file_name.is_empty() || !upload.data.is_empty() => {
                Some(self.store_file(upload).await?)
            }
            _ => None,
        };

        let model = paper::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            summary: Set(non_empty(input.summary)),
            content_url: Set(file.as_ref().map(|f| f.url.clone())),
            file_type: Set(file.as_ref().map(|f| f.file_type.clone())),
            raw_content: Set(file.as_ref().and_then(|f| f.raw_content.clone())),
            author_id: Set(non_empty(input.author_id)),
            created_at: Set(Utc::now().into()),
        };

        let created = match self.paper_repo.create(model).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(file) = &file {
                    if let Err(cleanup) = self.storage.delete(&file.key).await {
                        tracing::warn!(key = %file.key, error = %cleanup, "Failed to remove orphaned upload");
                    }
                }
                return Err(e);
            }
        };

        tracing::info!(
            paper_id = %created.id,
            file_type = ?created.file_type,
            "Paper created"
        );

        Ok(PaperResponse::from_model(created, 0))
    }

    async fn store_file(&self, upload: PaperUpload) -> AppResult<StoredFile> {
        let file_type = allowed_extension(&upload.file_name).ok_or_else(|| {
            AppError::BadRequest("Only .pdf, .md and .txt files are allowed".to_string())
        })?;

        if upload.data.len() > self.max_file_size {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} bytes",
                self.max_file_size
            )));
        }

        let key = generate_storage_key(&file_type);
        let uploaded = self
            .storage
            .upload(&key, &upload.data, &upload.content_type)
            .await?;

        Ok(StoredFile {
            key: uploaded.key,
            url: uploaded.url,
            raw_content: extract_raw_content(&file_type, &upload.data),
            file_type,
        })
    }
}

struct StoredFile {
    key: String,
    url: String,
    file_type: String,
    raw_content: Option<String>,
}

/// Lowercased extension of `file_name` when it is one of [`ALLOWED_EXTENSIONS`].
fn allowed_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Searchable text of markdown and plain text uploads.
fn extract_raw_content(file_type: &str, data: &[u8]) -> Option<String> {
    matches!(file_type, "md" | "txt")
        .then(|| String::from_utf8_lossy(data).chars().take(RAW_CONTENT_LIMIT).collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
