//! Vote ledger.
//!
//! Keeps at most one signed vote per (user, paper) and reports the live
//! aggregate after every submission. A submission of `0` retracts the vote
//! by deleting the row. The aggregate is always summed from the rows, never
//! kept as a counter.
//!
//! Uniqueness under concurrent submissions is left to the store: the
//! production [`VoteStore`] is a single atomic upsert, so this service holds
//! no locks of its own.

use std::sync::Arc;

use async_trait::async_trait;
use papershare_common::{AppError, AppResult};
use papershare_db::repositories::VoteRepository;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::external_id;

const MISSING_FIELDS: &str = "user_id and vote_value required";
const OUT_OF_RANGE: &str = "vote_value must be 1, -1, or 0";

/// A parsed vote submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ballot {
    /// `+1`
    Up,
    /// `-1`
    Down,
    /// `0`: remove any existing vote.
    Retract,
}

impl Ballot {
    /// Parse the `vote_value` field of a request body.
    ///
    /// Numbers and numeric strings are accepted as long as they equal
    /// `1`, `-1` or `0`.
    pub fn from_json(value: &Value) -> AppResult<Self> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| !n.is_nan())
        .ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))?;

        if number == 1.0 {
            Ok(Self::Up)
        } else if number == -1.0 {
            Ok(Self::Down)
        } else if number == 0.0 {
            Ok(Self::Retract)
        } else {
            Err(AppError::Validation(OUT_OF_RANGE.to_string()))
        }
    }

    /// Value stored in the vote row, or `None` when nothing is stored.
    #[must_use]
    pub const fn stored_value(self) -> Option<i16> {
        match self {
            Self::Up => Some(1),
            Self::Down => Some(-1),
            Self::Retract => None,
        }
    }
}

/// Request body of a vote submission, before validation.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitVoteInput {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub vote_value: Option<Value>,
}

/// Aggregate score of a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub votes: i64,
}

/// Storage the ledger runs on.
///
/// `upsert_or_delete` must be atomic per (user, paper): concurrent calls for
/// the same pair may never leave more than one row.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Write `ballot` for the pair: insert or overwrite for up/down, delete
    /// for retract. Deleting an absent vote is not an error.
    async fn upsert_or_delete(&self, user_id: &str, paper_id: &str, ballot: Ballot)
    -> AppResult<()>;

    /// Sum of all vote values on a paper; 0 when there are none.
    async fn sum_votes(&self, paper_id: &str) -> AppResult<i64>;
}

#[async_trait]
impl VoteStore for VoteRepository {
    async fn upsert_or_delete(
        &self,
        user_id: &str,
        paper_id: &str,
        ballot: Ballot,
    ) -> AppResult<()> {
        match ballot.stored_value() {
            Some(value) => self.upsert(user_id, paper_id, value).await,
            None => self.delete(user_id, paper_id).await.map(|_| ()),
        }
    }

    async fn sum_votes(&self, paper_id: &str) -> AppResult<i64> {
        self.sum_for_paper(paper_id).await
    }
}

/// Vote ledger service.
#[derive(Clone)]
pub struct VoteService {
    store: Arc<dyn VoteStore>,
}

impl VoteService {
    /// Create a vote service over any store.
    #[must_use]
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    /// Create a vote service backed by the database.
    #[must_use]
    pub fn with_repository(repo: VoteRepository) -> Self {
        Self::new(Arc::new(repo))
    }

    /// Validate a raw submission and apply it.
    ///
    /// Nothing is written when validation fails.
    pub async fn submit(&self, paper_id: &str, input: SubmitVoteInput) -> AppResult<VoteTally> {
        let user_id = input
            .user_id
            .as_ref()
            .and_then(external_id)
            .ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))?;

        let ballot = input
            .vote_value
            .as_ref()
            .ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))
            .and_then(Ballot::from_json)?;

        self.cast(&user_id, paper_id, ballot).await
    }

    /// Apply a ballot and return the paper's new aggregate.
    pub async fn cast(&self, user_id: &str, paper_id: &str, ballot: Ballot) -> AppResult<VoteTally> {
        if user_id.trim().is_empty() {
            return Err(AppError::Validation("user_id required".to_string()));
        }
        if paper_id.trim().is_empty() {
            return Err(AppError::Validation("paper id required".to_string()));
        }

        self.store.upsert_or_delete(user_id, paper_id, ballot).await?;
        let votes = self.store.sum_votes(paper_id).await?;

        tracing::debug!(
            user_id = %user_id,
            paper_id = %paper_id,
            ballot = ?ballot,
            votes,
            "Vote recorded"
        );

        Ok(VoteTally { votes })
    }

    /// Current aggregate of a paper.
    pub async fn tally(&self, paper_id: &str) -> AppResult<VoteTally> {
        let votes = self.store.sum_votes(paper_id).await?;
        Ok(VoteTally { votes })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryVoteStore;
    use futures::future::join_all;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value as DbValue};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn service() -> (VoteService, Arc<MemoryVoteStore>) {
        let store = Arc::new(MemoryVoteStore::new());
        (VoteService::new(store.clone()), store)
    }

    fn input(user_id: Value, vote_value: Value) -> SubmitVoteInput {
        SubmitVoteInput {
            user_id: Some(user_id),
            vote_value: Some(vote_value),
        }
    }

    fn validation_message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_ballot_from_json() {
        assert_eq!(Ballot::from_json(&json!(1)).unwrap(), Ballot::Up);
        assert_eq!(Ballot::from_json(&json!(-1)).unwrap(), Ballot::Down);
        assert_eq!(Ballot::from_json(&json!(0)).unwrap(), Ballot::Retract);
        assert_eq!(Ballot::from_json(&json!(1.0)).unwrap(), Ballot::Up);
        assert_eq!(Ballot::from_json(&json!("-1")).unwrap(), Ballot::Down);
        assert_eq!(Ballot::from_json(&json!(" 0 ")).unwrap(), Ballot::Retract);
    }

    #[test]
    fn test_ballot_rejects_out_of_range() {
        for value in [json!(2), json!(-2), json!(0.5), json!("3")] {
            let msg = validation_message(Ballot::from_json(&value).unwrap_err());
            assert_eq!(msg, OUT_OF_RANGE);
        }
    }

    #[test]
    fn test_ballot_rejects_non_numeric() {
        for value in [json!("up"), json!(""), json!(true), json!(null), json!([1]), json!("NaN")] {
            let msg = validation_message(Ballot::from_json(&value).unwrap_err());
            assert_eq!(msg, MISSING_FIELDS);
        }
    }

    #[tokio::test]
    async fn test_scenario_from_empty_to_retracted() {
        let (service, store) = service();

        let tally = service.submit("x", input(json!("a"), json!(1))).await.unwrap();
        assert_eq!(tally.votes, 1);

        let tally = service.submit("x", input(json!("b"), json!(1))).await.unwrap();
        assert_eq!(tally.votes, 2);

        let tally = service.submit("x", input(json!("a"), json!(-1))).await.unwrap();
        assert_eq!(tally.votes, 0);

        let tally = service.submit("x", input(json!("a"), json!(0))).await.unwrap();
        assert_eq!(tally.votes, 1);
        assert_eq!(store.vote_of("a", "x"), None);
        assert_eq!(store.vote_of("b", "x"), Some(1));
    }

    #[tokio::test]
    async fn test_repeated_submission_is_idempotent() {
        let (service, store) = service();
        service.cast("b", "x", Ballot::Down).await.unwrap();

        for value in [Ballot::Up, Ballot::Down] {
            let first = service.cast("a", "x", value).await.unwrap();
            for _ in 0..5 {
                assert_eq!(service.cast("a", "x", value).await.unwrap(), first);
            }
        }
        assert_eq!(store.rows_for("x"), 2);
    }

    #[tokio::test]
    async fn test_up_then_retract_restores_aggregate() {
        let (service, _) = service();
        service.cast("b", "x", Ballot::Down).await.unwrap();
        let before = service.tally("x").await.unwrap().votes;

        service.cast("a", "x", Ballot::Up).await.unwrap();
        let after = service.cast("a", "x", Ballot::Retract).await.unwrap();

        assert_eq!(after.votes, before);
    }

    #[tokio::test]
    async fn test_up_then_down_moves_by_two() {
        let (service, store) = service();
        service.cast("b", "x", Ballot::Up).await.unwrap();

        let up = service.cast("a", "x", Ballot::Up).await.unwrap();
        let down = service.cast("a", "x", Ballot::Down).await.unwrap();

        assert_eq!(down.votes - up.votes, -2);
        assert_eq!(store.rows_for("x"), 2);
    }

    #[tokio::test]
    async fn test_retract_without_vote_is_noop() {
        let (service, store) = service();
        let tally = service.cast("a", "x", Ballot::Retract).await.unwrap();
        assert_eq!(tally.votes, 0);
        assert_eq!(store.rows_for("x"), 0);
    }

    #[tokio::test]
    async fn test_invalid_value_leaves_aggregate_unchanged() {
        let (service, store) = service();
        service.cast("a", "x", Ballot::Up).await.unwrap();

        let err = service
            .submit("x", input(json!("a"), json!(2)))
            .await
            .unwrap_err();
        assert_eq!(validation_message(err), OUT_OF_RANGE);
        assert_eq!(service.tally("x").await.unwrap().votes, 1);
        assert_eq!(store.vote_of("a", "x"), Some(1));
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected() {
        let (service, store) = service();

        let missing_user = SubmitVoteInput {
            user_id: None,
            vote_value: Some(json!(1)),
        };
        let missing_value = SubmitVoteInput {
            user_id: Some(json!("a")),
            vote_value: None,
        };
        let zero_user = input(json!(0), json!(1));

        for body in [missing_user, missing_value, zero_user] {
            let err = service.submit("x", body).await.unwrap_err();
            assert_eq!(validation_message(err), MISSING_FIELDS);
        }
        assert_eq!(store.rows_for("x"), 0);
    }

    #[tokio::test]
    async fn test_blank_paper_id_is_rejected() {
        let (service, _) = service();
        let err = service.cast("a", "  ", Ballot::Up).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_numeric_user_id_is_accepted() {
        let (service, store) = service();
        service.submit("x", input(json!(1), json!("1"))).await.unwrap();
        assert_eq!(store.vote_of("1", "x"), Some(1));
    }

    #[tokio::test]
    async fn test_integral_float_user_id_overwrites_integer_row() {
        let (service, store) = service();
        service.submit("x", input(json!(1), json!(1))).await.unwrap();

        let tally = service.submit("x", input(json!(1.0), json!(-1))).await.unwrap();
        assert_eq!(tally.votes, -1);
        assert_eq!(store.rows_for("x"), 1);
    }

    #[tokio::test]
    async fn test_unknown_paper_is_not_found() {
        let store = Arc::new(MemoryVoteStore::with_papers(["x"]));
        let service = VoteService::new(store);

        let err = service.cast("a", "y", Ballot::Up).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_keep_one_row_per_pair() {
        let (service, store) = service();

        let tasks = (0..200).map(|i| {
            let service = service.clone();
            let user = format!("user{}", i % 5);
            let ballot = if i % 3 == 1 { Ballot::Down } else { Ballot::Up };
            tokio::spawn(async move { service.cast(&user, "x", ballot).await })
        });

        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(store.rows_for("x"), 5);
        let expected: i64 = (0..5)
            .filter_map(|i| store.vote_of(&format!("user{i}"), "x"))
            .map(i64::from)
            .sum();
        assert_eq!(service.tally("x").await.unwrap().votes, expected);
    }

    #[tokio::test]
    async fn test_repository_store_upserts_then_sums() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[BTreeMap::from([("votes", DbValue::BigInt(Some(4)))])]])
                .into_connection(),
        );

        let service = VoteService::with_repository(VoteRepository::new(db));
        let tally = service.cast("a", "x", Ballot::Up).await.unwrap();
        assert_eq!(tally.votes, 4);
    }

    #[tokio::test]
    async fn test_repository_store_surfaces_storage_errors() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_errors([sea_orm::DbErr::Custom("disk full".to_string())])
                .into_connection(),
        );

        let service = VoteService::with_repository(VoteRepository::new(db));
        let err = service.cast("a", "x", Ballot::Retract).await.unwrap_err();
        assert!(err.is_server_error());
    }
}
