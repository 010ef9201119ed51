//! Poll service.

use chrono::{DateTime, FixedOffset, Utc};
use pollhub_common::{AppError, AppResult, IdGenerator, config::PollsConfig};
use pollhub_db::{
    entities::poll::{self, PollType},
    repositories::PollRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::vote::VoteService;
use crate::tally::{PollOption, Selection, Tally};

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    votes: VoteService,
    limits: PollsConfig,
    id_gen: IdGenerator,
}

/// Input for creating a poll.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollInput {
    /// Question shown above the choices.
    #[validate(length(min = 1, max = 300))]
    pub question: String,
    /// Category used for listing.
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Choice texts, in display order.
    pub options: Vec<String>,
    /// Whether a vote may pick one choice or several.
    pub poll_type: PollType,
    /// When voting stops; open forever if unset.
    #[serde(default)]
    pub close_date: Option<DateTime<Utc>>,
    /// Listed publicly.
    #[serde(default)]
    pub visibility_public: bool,
    /// Featured in the trending list.
    #[serde(default)]
    pub trending: bool,
}

/// Input for editing a poll. Choices, counts and type cannot change.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollInput {
    /// New question.
    #[validate(length(min = 1, max = 300))]
    pub question: Option<String>,
    /// New category.
    #[validate(length(min = 1, max = 64))]
    pub category: Option<String>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
    /// `Some(None)` clears the close date.
    #[allow(clippy::option_option)]
    pub close_date: Option<Option<DateTime<Utc>>>,
    /// New public visibility.
    pub visibility_public: Option<bool>,
    /// New trending flag.
    pub trending: Option<bool>,
}

/// A poll as handed to the request layer.
///
/// `options[i].voteCount` and `votes[i]` are the same number: both are read
/// from the single stored count array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollView {
    /// Poll id.
    pub id: String,
    /// Question text.
    pub question: String,
    /// Listing category.
    pub category: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Single or multiple choice.
    pub poll_type: PollType,
    /// When voting stops, if ever.
    pub close_date: Option<DateTime<FixedOffset>>,
    /// Listed publicly.
    pub visibility_public: bool,
    /// Featured in the trending list.
    pub trending: bool,
    /// Choices with their counts.
    pub options: Vec<PollOption>,
    /// Raw counts, index-aligned with `options`.
    pub votes: Vec<u64>,
    /// Sum of `votes`.
    pub total_votes: u64,
    /// Tally version after the last write.
    pub version: i32,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl PollView {
    /// Combine a poll row with its already-decoded tally.
    pub fn new(model: poll::Model, tally: Tally) -> AppResult<Self> {
        let tags = serde_json::from_value(model.tags)
            .map_err(|e| AppError::Internal(format!("Invalid poll tags: {e}")))?;
        Ok(Self {
            id: model.id,
            question: model.question,
            category: model.category,
            tags,
            poll_type: model.poll_type,
            close_date: model.close_date,
            visibility_public: model.visibility_public,
            trending: model.trending,
            options: tally.options(),
            total_votes: tally.total(),
            votes: tally.votes().to_vec(),
            version: model.version,
            created_at: model.created_at,
        })
    }

    /// Decode a poll row.
    pub fn from_model(model: poll::Model) -> AppResult<Self> {
        let tally = Tally::from_model(&model)?;
        Self::new(model, tally)
    }
}

/// Whether `poll` accepts votes at `now`.
#[must_use]
pub fn is_open(poll: &poll::Model, now: DateTime<Utc>) -> bool {
    poll.close_date
        .is_none_or(|close| close.with_timezone(&Utc) > now)
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository, votes: VoteService, limits: PollsConfig) -> Self {
        Self {
            poll_repo,
            votes,
            limits,
            id_gen: IdGenerator::new(),
        }
    }

    fn validate_choices(&self, choices: &[String]) -> AppResult<()> {
        if choices.len() < 2 {
            return Err(AppError::Validation(
                "Poll must have at least 2 options".to_string(),
            ));
        }
        if choices.len() > self.limits.max_choices {
            return Err(AppError::Validation(format!(
                "Poll cannot have more than {} options",
                self.limits.max_choices
            )));
        }
        for choice in choices {
            if choice.trim().is_empty() {
                return Err(AppError::Validation(
                    "Poll options cannot be empty".to_string(),
                ));
            }
            if choice.chars().count() > self.limits.max_choice_length {
                return Err(AppError::Validation(format!(
                    "Poll option is too long (max {} chars)",
                    self.limits.max_choice_length
                )));
            }
        }
        Ok(())
    }

    /// Create a poll with every count at zero.
    pub async fn create_poll(&self, input: CreatePollInput) -> AppResult<PollView> {
        input.validate()?;
        self.validate_choices(&input.options)?;

        let tally = Tally::zeroed(input.options);

        let model = poll::ActiveModel {
            id: Set(self.id_gen.generate_uuid_v4()),
            question: Set(input.question),
            category: Set(input.category),
            tags: Set(json!(input.tags)),
            choices: Set(json!(tally.choices())),
            votes: Set(json!(tally.votes())),
            poll_type: Set(input.poll_type),
            close_date: Set(input.close_date.map(Into::into)),
            visibility_public: Set(input.visibility_public),
            trending: Set(input.trending),
            version: Set(0),
            created_at: Set(Utc::now().into()),
        };

        let created = self.poll_repo.create(model).await?;
        tracing::info!(poll_id = %created.id, options = tally.choices().len(), "Created poll");

        PollView::from_model(created)
    }

    /// Get a poll by ID.
    pub async fn get_poll(&self, poll_id: &str) -> AppResult<PollView> {
        PollView::from_model(self.poll_repo.get_by_id(poll_id).await?)
    }

    /// Polls still open at `now`, optionally limited to one category.
    pub async fn list_open(
        &self,
        category: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PollView>> {
        self.poll_repo
            .find_open(category, now)
            .await?
            .into_iter()
            .map(PollView::from_model)
            .collect()
    }

    /// Polls flagged as trending.
    pub async fn list_trending(&self) -> AppResult<Vec<PollView>> {
        self.poll_repo
            .find_trending()
            .await?
            .into_iter()
            .map(PollView::from_model)
            .collect()
    }

    /// Edit a poll's metadata.
    pub async fn update_poll(&self, poll_id: &str, input: UpdatePollInput) -> AppResult<PollView> {
        input.validate()?;

        let poll = self.poll_repo.get_by_id(poll_id).await?;
        let mut active: poll::ActiveModel = poll.into();

        if let Some(question) = input.question {
            active.question = Set(question);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(tags) = input.tags {
            active.tags = Set(json!(tags));
        }
        if let Some(close_date) = input.close_date {
            active.close_date = Set(close_date.map(Into::into));
        }
        if let Some(visibility_public) = input.visibility_public {
            active.visibility_public = Set(visibility_public);
        }
        if let Some(trending) = input.trending {
            active.trending = Set(trending);
        }

        PollView::from_model(self.poll_repo.update(active).await?)
    }

    /// Delete a poll and its comments.
    pub async fn delete_poll(&self, poll_id: &str) -> AppResult<()> {
        if !self.poll_repo.delete(poll_id).await? {
            return Err(AppError::PollNotFound(poll_id.to_string()));
        }
        tracing::info!(poll_id, "Deleted poll");
        Ok(())
    }

    /// Vote on a poll that is still open at `now`.
    pub async fn vote(
        &self,
        poll_id: &str,
        selection: &Selection,
        now: DateTime<Utc>,
    ) -> AppResult<PollView> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        if !is_open(&poll, now) {
            return Err(AppError::PollClosed(poll_id.to_string()));
        }

        self.votes.apply_vote(poll_id, selection).await
    }
}
