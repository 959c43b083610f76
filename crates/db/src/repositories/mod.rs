//! Repositories for database access.

mod comment;
mod paper;
mod vote;

pub use comment::CommentRepository;
pub use paper::{PaperListQuery, PaperRepository};
pub use vote::VoteRepository;

use papershare_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map a failed write to an [`AppError`].
///
/// Every foreign key in the schema points at `paper`, so a violation means
/// the referenced paper does not exist.
pub(crate) fn map_write_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::NotFound("Paper not found".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}
