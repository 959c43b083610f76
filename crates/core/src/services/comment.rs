//! Comment service.

use chrono::{DateTime, FixedOffset, Utc};
use papershare_common::{AppError, AppResult, IdGenerator};
use papershare_db::{entities::comment, repositories::CommentRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::external_id;

const MISSING_FIELDS: &str = "user_id and content required";

/// Request body of a new comment.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateCommentInput {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    #[validate(length(max = 5000, message = "content must be at most 5000 characters"))]
    pub content: Option<String>,
}

/// Comment as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub paper_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<comment::Model> for CommentResponse {
    fn from(model: comment::Model) -> Self {
        Self {
            id: model.id,
            paper_id: model.paper_id,
            user_id: model.user_id,
            content: model.content,
            created_at: model.created_at,
        }
    }
}

/// Comment service.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository) -> Self {
        Self {
            comment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comments on a paper, oldest first.
    pub async fn list(&self, paper_id: &str) -> AppResult<Vec<CommentResponse>> {
        let comments = self.comment_repo.find_by_paper(paper_id).await?;
        Ok(comments.into_iter().map(Into::into).collect())
    }

    /// Add a comment to a paper.
    pub async fn create(
        &self,
        paper_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<CommentResponse> {
        let user_id = input.user_id.as_ref().and_then(external_id);
        // The length limit applies to the text that gets stored.
        let input = CreateCommentInput {
            content: input
                .content
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            ..input
        };

        let (Some(user_id), Some(content)) = (user_id, input.content.as_deref()) else {
            return Err(AppError::Validation(MISSING_FIELDS.to_string()));
        };
        input.validate()?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            paper_id: Set(paper_id.to_string()),
            user_id: Set(user_id),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let created = self.comment_repo.create(model).await?;
        tracing::debug!(comment_id = %created.id, paper_id = %paper_id, "Comment created");

        Ok(created.into())
    }
}
