//! Comment service.

use chrono::Utc;
use pollhub_common::{AppError, AppResult, IdGenerator, config::CommentsConfig};
use pollhub_db::{
    entities::comment,
    repositories::{CommentRepository, PollRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::comment_tree::{CommentNode, assemble_comment_tree};

/// Comment service for poll discussions.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    poll_repo: PollRepository,
    limits: CommentsConfig,
    id_gen: IdGenerator,
}

/// Input for posting a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentInput {
    /// Author reference.
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    /// Comment body; must not be blank.
    pub content: String,
    /// Comment being replied to, if any.
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        poll_repo: PollRepository,
        limits: CommentsConfig,
    ) -> Self {
        Self {
            comment_repo,
            poll_repo,
            limits,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a comment or reply on a poll.
    pub async fn add_comment(
        &self,
        poll_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        if input.content.trim().is_empty() {
            return Err(AppError::Validation("Content is required".to_string()));
        }
        if input.content.chars().count() > self.limits.max_content_length {
            return Err(AppError::Validation(format!(
                "Comment is too long (max {} chars)",
                self.limits.max_content_length
            )));
        }

        self.poll_repo.get_by_id(poll_id).await?;

        if let Some(ref parent_id) = input.parent_id {
            let parent = self.comment_repo.get_by_id(parent_id).await?;
            if parent.poll_id != poll_id {
                return Err(AppError::BadRequest(
                    "Parent comment belongs to a different poll".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            poll_id: Set(poll_id.to_string()),
            user_id: Set(input.user_id),
            parent_id: Set(input.parent_id),
            content: Set(input.content),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = self.comment_repo.create(model).await?;

        if let Some(ref parent_id) = created.parent_id {
            tracing::debug!(comment_id = %created.id, reply_to = %parent_id, "Created reply");
        } else {
            tracing::debug!(comment_id = %created.id, poll_id, "Created comment");
        }

        Ok(created)
    }

    /// A poll's discussion as reply trees, oldest first.
    pub async fn get_comment_tree(&self, poll_id: &str) -> AppResult<Vec<CommentNode>> {
        let comments = self.comment_repo.find_by_poll(poll_id).await?;
        Ok(assemble_comment_tree(comments))
    }

    /// Delete a comment. Replies stay and surface at the top level.
    pub async fn delete_comment(&self, comment_id: &str) -> AppResult<()> {
        if !self.comment_repo.delete(comment_id).await? {
            return Err(AppError::CommentNotFound(comment_id.to_string()));
        }
        Ok(())
    }
}
