//! Poll persistence used by the vote service.
//!
//! Votes are written with optimistic concurrency: every write names the
//! version it was computed from, and the store refuses it if the poll has
//! moved on since.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use pollhub_common::AppResult;
use pollhub_db::{entities::poll, repositories::PollRepository};
use serde_json::json;
use tokio::sync::RwLock;

/// Result of a versioned vote write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The counts were stored and the version bumped.
    Written,
    /// The stored version no longer matches (or the poll is gone).
    VersionConflict,
}

/// Storage capability needed to tally votes.
#[async_trait]
pub trait PollStore: Send + Sync {
    /// Read the current state of a poll.
    async fn read_poll(&self, poll_id: &str) -> AppResult<Option<poll::Model>>;

    /// Replace the vote counts if the poll is still at `expected_version`.
    async fn write_votes(
        &self,
        poll_id: &str,
        votes: &[u64],
        expected_version: i32,
    ) -> AppResult<WriteOutcome>;
}

/// Shared handle to a poll store.
pub type PollStoreService = Arc<dyn PollStore>;

#[async_trait]
impl PollStore for PollRepository {
    async fn read_poll(&self, poll_id: &str) -> AppResult<Option<poll::Model>> {
        self.find_by_id(poll_id).await
    }

    async fn write_votes(
        &self,
        poll_id: &str,
        votes: &[u64],
        expected_version: i32,
    ) -> AppResult<WriteOutcome> {
        if self
            .update_votes_if_version(poll_id, votes, expected_version)
            .await?
        {
            Ok(WriteOutcome::Written)
        } else {
            Ok(WriteOutcome::VersionConflict)
        }
    }
}

/// In-process poll store.
///
/// State is owned by the instance and is lost when it is dropped; nothing
/// is persisted across restarts.
#[derive(Debug, Default)]
pub struct MemoryPollStore {
    polls: RwLock<HashMap<String, poll::Model>>,
}

impl MemoryPollStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a poll.
    pub async fn insert(&self, model: poll::Model) {
        self.polls.write().await.insert(model.id.clone(), model);
    }

    /// Snapshot of a poll.
    pub async fn get(&self, poll_id: &str) -> Option<poll::Model> {
        self.polls.read().await.get(poll_id).cloned()
    }

    /// Drop every poll.
    pub async fn clear(&self) {
        self.polls.write().await.clear();
    }
}

#[async_trait]
impl PollStore for MemoryPollStore {
    async fn read_poll(&self, poll_id: &str) -> AppResult<Option<poll::Model>> {
        Ok(self.get(poll_id).await)
    }

    async fn write_votes(
        &self,
        poll_id: &str,
        votes: &[u64],
        expected_version: i32,
    ) -> AppResult<WriteOutcome> {
        let mut polls = self.polls.write().await;
        match polls.get_mut(poll_id) {
            Some(model) if model.version == expected_version => {
                model.votes = json!(votes);
                model.version += 1;
                Ok(WriteOutcome::Written)
            }
            _ => Ok(WriteOutcome::VersionConflict),
        }
    }
}
