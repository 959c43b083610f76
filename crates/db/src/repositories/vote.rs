//! Vote repository.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use papershare_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::OnConflict,
};

use super::map_write_err;
use crate::entities::{Vote, vote};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a vote, or overwrite the value of the existing row for the pair.
    ///
    /// A single `INSERT .. ON CONFLICT (user_id, paper_id) DO UPDATE`, so two
    /// concurrent calls for the same pair end up as one row.
    pub async fn upsert(&self, user_id: &str, paper_id: &str, vote_value: i16) -> AppResult<()> {
        let now = Utc::now();
        let model = vote::ActiveModel {
            user_id: Set(user_id.to_string()),
            paper_id: Set(paper_id.to_string()),
            vote_value: Set(vote_value),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Vote::insert(model)
            .on_conflict(
                OnConflict::columns([vote::Column::UserId, vote::Column::PaperId])
                    .update_columns([vote::Column::VoteValue, vote::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(map_write_err)?;

        Ok(())
    }

    /// Delete the vote for the pair. Returns the number of rows removed (0 or 1).
    pub async fn delete(&self, user_id: &str, paper_id: &str) -> AppResult<u64> {
        let result = Vote::delete_many()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::PaperId.eq(paper_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// All votes on a paper.
    pub async fn find_by_paper(&self, paper_id: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::PaperId.eq(paper_id))
            .order_by_asc(vote::Column::UserId)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sum of vote values for a paper; 0 when it has no votes.
    pub async fn sum_for_paper(&self, paper_id: &str) -> AppResult<i64> {
        #[derive(FromQueryResult)]
        struct SumResult {
            votes: Option<i64>,
        }

        let result = Vote::find()
            .filter(vote::Column::PaperId.eq(paper_id))
            .select_only()
            .column_as(vote::Column::VoteValue.sum(), "votes")
            .into_model::<SumResult>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.and_then(|r| r.votes).unwrap_or(0))
    }

    /// Sums for several papers in one grouped query.
    ///
    /// Papers without votes are absent from the map.
    pub async fn sum_for_papers(&self, paper_ids: &[String]) -> AppResult<HashMap<String, i64>> {
        if paper_ids.is_empty() {
            return Ok(HashMap::new());
        }

        #[derive(FromQueryResult)]
        struct PaperSum {
            paper_id: String,
            votes: Option<i64>,
        }

        let rows = Vote::find()
            .filter(vote::Column::PaperId.is_in(paper_ids.iter().cloned()))
            .select_only()
            .column(vote::Column::PaperId)
            .column_as(vote::Column::VoteValue.sum(), "votes")
            .group_by(vote::Column::PaperId)
            .into_model::<PaperSum>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.paper_id, row.votes.unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn sum_row(votes: Option<i64>) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("votes", Value::BigInt(votes))])
    }

    fn exec_result(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn into_log(db: Arc<DatabaseConnection>) -> String {
        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        format!("{:?}", conn.into_transaction_log())
    }

    #[tokio::test]
    async fn test_upsert_uses_on_conflict_on_pair() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(1)])
                .into_connection(),
        );

        let repo = VoteRepository::new(Arc::clone(&db));
        repo.upsert("user1", "paper1", 1).await.unwrap();
        drop(repo);

        let log = into_log(db);
        assert!(log.contains("INSERT INTO"));
        assert!(log.contains("ON CONFLICT"));
        assert!(log.contains("DO UPDATE SET"));
        assert!(!log.contains("RETURNING"));
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(1), exec_result(0)])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        assert_eq!(repo.delete("user1", "paper1").await.unwrap(), 1);
        // Retracting again is a no-op.
        assert_eq!(repo.delete("user1", "paper1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sum_for_paper() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sum_row(Some(3))]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        assert_eq!(repo.sum_for_paper("paper1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sum_for_paper_without_votes_is_zero() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sum_row(None)]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        assert_eq!(repo.sum_for_paper("paper1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sum_for_papers_groups_by_paper() {
        let rows = vec![
            BTreeMap::from([
                ("paper_id", Value::from("p1")),
                ("votes", Value::BigInt(Some(2))),
            ]),
            BTreeMap::from([
                ("paper_id", Value::from("p2")),
                ("votes", Value::BigInt(Some(-1))),
            ]),
        ];
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rows])
                .into_connection(),
        );

        let repo = VoteRepository::new(Arc::clone(&db));
        let sums = repo
            .sum_for_papers(&["p1".to_string(), "p2".to_string(), "p3".to_string()])
            .await
            .unwrap();
        drop(repo);

        assert_eq!(sums.get("p1"), Some(&2));
        assert_eq!(sums.get("p2"), Some(&-1));
        assert_eq!(sums.get("p3"), None);
        assert!(into_log(db).contains("GROUP BY"));
    }

    #[tokio::test]
    async fn test_sum_for_no_papers_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = VoteRepository::new(Arc::clone(&db));
        assert!(repo.sum_for_papers(&[]).await.unwrap().is_empty());
        drop(repo);

        assert_eq!(into_log(db), "[]");
    }
}
