//! Vote service.
//!
//! Applies votes with optimistic concurrency: read the poll, compute the new
//! counts, write them back conditioned on the version that was read. A stale
//! read is retried from scratch up to `voting.max_attempts` times.
//!
//! Whether the poll is still open is not checked here; see
//! [`PollService::vote`](super::poll::PollService::vote).

use pollhub_common::{AppError, AppResult, config::VotingConfig};
use serde_json::json;

use super::{
    poll::PollView,
    poll_store::{PollStoreService, WriteOutcome},
};
use crate::tally::{Selection, Tally};

/// Vote service for tallying votes.
#[derive(Clone)]
pub struct VoteService {
    store: PollStoreService,
    max_attempts: u32,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub fn new(store: PollStoreService, config: &VotingConfig) -> Self {
        Self {
            store,
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// Add one vote to each distinct option in `selection`.
    ///
    /// The poll's stored type decides whether several options are allowed.
    pub async fn apply_vote(&self, poll_id: &str, selection: &Selection) -> AppResult<PollView> {
        for attempt in 1..=self.max_attempts {
            let mut poll = self
                .store
                .read_poll(poll_id)
                .await?
                .ok_or_else(|| AppError::PollNotFound(poll_id.to_string()))?;

            let updated = Tally::from_model(&poll)?.apply(poll.poll_type, selection)?;

            match self
                .store
                .write_votes(poll_id, updated.votes(), poll.version)
                .await?
            {
                WriteOutcome::Written => {
                    tracing::debug!(poll_id, attempt, "Vote applied");
                    poll.votes = json!(updated.votes());
                    poll.version += 1;
                    return PollView::new(poll, updated);
                }
                WriteOutcome::VersionConflict => {
                    tracing::debug!(poll_id, attempt, "Stale poll read, retrying vote");
                }
            }
        }

        tracing::warn!(
            poll_id,
            attempts = self.max_attempts,
            "Vote abandoned after repeated concurrent updates"
        );
        Err(AppError::ConcurrentUpdateConflict {
            poll_id: poll_id.to_string(),
            attempts: self.max_attempts,
        })
    }
}
