//! Test helpers shared with dependent crates.
//!
//! Enabled in this crate's tests and through the `test-utils` feature.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use papershare_common::{AppError, AppResult};

use crate::services::{Ballot, VoteStore};

/// In-memory [`VoteStore`].
///
/// Keyed by (user, paper), so the one-row-per-pair rule holds by
/// construction. When created with [`MemoryVoteStore::with_papers`], writes
/// to any other paper fail with `NotFound` like the foreign key does.
#[derive(Debug, Default)]
pub struct MemoryVoteStore {
    votes: Mutex<HashMap<(String, String), i16>>,
    papers: Option<HashSet<String>>,
}

impl MemoryVoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that only accepts votes on the given papers.
    #[must_use]
    pub fn with_papers<I, S>(papers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            votes: Mutex::default(),
            papers: Some(papers.into_iter().map(Into::into).collect()),
        }
    }

    /// Stored value for a pair, if any.
    #[must_use]
    pub fn vote_of(&self, user_id: &str, paper_id: &str) -> Option<i16> {
        self.lock()
            .get(&(user_id.to_string(), paper_id.to_string()))
            .copied()
    }

    /// Number of vote rows on a paper.
    #[must_use]
    pub fn rows_for(&self, paper_id: &str) -> usize {
        self.lock().keys().filter(|(_, p)| p == paper_id).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), i16>> {
        self.votes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl VoteStore for MemoryVoteStore {
    async fn upsert_or_delete(
        &self,
        user_id: &str,
        paper_id: &str,
        ballot: Ballot,
    ) -> AppResult<()> {
        let key = (user_id.to_string(), paper_id.to_string());
        let mut votes = self.lock();

        match ballot.stored_value() {
            Some(value) => {
                if let Some(papers) = &self.papers {
                    if !papers.contains(paper_id) {
                        return Err(AppError::NotFound("Paper not found".to_string()));
                    }
                }
                votes.insert(key, value);
            }
            None => {
                votes.remove(&key);
            }
        }

        Ok(())
    }

    async fn sum_votes(&self, paper_id: &str) -> AppResult<i64> {
        Ok(self
            .lock()
            .iter()
            .filter(|((_, p), _)| p == paper_id)
            .map(|(_, v)| i64::from(*v))
            .sum())
    }
}
