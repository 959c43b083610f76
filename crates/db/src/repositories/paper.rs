//! Paper repository.

use std::sync::Arc;

use papershare_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
    sea_query::{Expr, extension::postgres::PgExpr},
};

use super::map_write_err;
use crate::entities::{Paper, paper};

/// Filters and paging for [`PaperRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct PaperListQuery {
    /// Case-insensitive substring matched against title, abstract and text.
    pub search: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

/// Paper repository for database operations.
#[derive(Clone)]
pub struct PaperRepository {
    db: Arc<DatabaseConnection>,
}

impl PaperRepository {
    /// Create a new paper repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a paper by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<paper::Model>> {
        Paper::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a paper by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<paper::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Not found".to_string()))
    }

    /// Create a new paper.
    pub async fn create(&self, model: paper::ActiveModel) -> AppResult<paper::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Newest papers first, optionally filtered by a search term.
    pub async fn list(&self, query: &PaperListQuery) -> AppResult<Vec<paper::Model>> {
        let mut select = Paper::find();

        if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
            let pattern = like_pattern(term);
            select = select.filter(
                Condition::any()
                    .add(Expr::col(paper::Column::Title).ilike(pattern.clone()))
                    .add(Expr::col(paper::Column::Summary).ilike(pattern.clone()))
                    .add(Expr::col(paper::Column::RawContent).ilike(pattern)),
            );
        }

        select
            .order_by_desc(paper::Column::CreatedAt)
            .order_by_desc(paper::Column::Id)
            .limit(query.limit)
            .offset(query.offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// `%term%` with LIKE metacharacters escaped (backslash is Postgres's default escape).
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Set};

    fn create_test_paper(id: &str, title: &str) -> paper::Model {
        paper::Model {
            id: id.to_string(),
            title: title.to_string(),
            summary: Some("An abstract".to_string()),
            content_url: None,
            file_type: None,
            raw_content: None,
            author_id: Some("1".to_string()),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\"), "%c:\\\\%");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<paper::Model>::new()])
                .into_connection(),
        );

        let repo = PaperRepository::new(db);
        let err = repo.get_by_id("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_returns_inserted_row() {
        let paper = create_test_paper("p1", "Borrow checking in practice");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[paper.clone()]])
                .into_connection(),
        );

        let repo = PaperRepository::new(db);
        let created = repo
            .create(paper::ActiveModel {
                id: Set(paper.id.clone()),
                title: Set(paper.title.clone()),
                summary: Set(paper.summary.clone()),
                content_url: Set(None),
                file_type: Set(None),
                raw_content: Set(None),
                author_id: Set(paper.author_id.clone()),
                created_at: Set(paper.created_at),
            })
            .await
            .unwrap();

        assert_eq!(created, paper);
    }

    #[tokio::test]
    async fn test_list_with_search_uses_ilike() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![create_test_paper("p1", "Ownership")]])
                .into_connection(),
        );

        let repo = PaperRepository::new(Arc::clone(&db));
        let papers = repo
            .list(&PaperListQuery {
                search: Some("owner".to_string()),
                limit: 20,
                offset: 0,
            })
            .await
            .unwrap();
        drop(repo);
        assert_eq!(papers.len(), 1);

        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let log = format!("{:?}", conn.into_transaction_log());
        assert!(log.contains("ILIKE"));
        assert!(log.contains("ORDER BY"));
    }

    #[tokio::test]
    async fn test_list_without_search_has_no_filter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<paper::Model>::new()])
                .into_connection(),
        );

        let repo = PaperRepository::new(Arc::clone(&db));
        repo.list(&PaperListQuery {
            search: Some(String::new()),
            limit: 20,
            offset: 40,
        })
        .await
        .unwrap();
        drop(repo);

        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let log = format!("{:?}", conn.into_transaction_log());
        assert!(!log.contains("ILIKE"));
        assert!(log.contains("OFFSET"));
    }
}
