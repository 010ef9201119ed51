//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, poll};
use chrono::{DateTime, Utc};
use pollhub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, sea_query::Expr,
};
use serde_json::json;

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PollNotFound(id.to_string()))
    }

    /// Find polls still accepting votes at `now`, newest first.
    pub async fn find_open(
        &self,
        category: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<poll::Model>> {
        let mut query = Poll::find().filter(
            Condition::any()
                .add(poll::Column::CloseDate.is_null())
                .add(poll::Column::CloseDate.gt(now)),
        );

        if let Some(category) = category {
            query = query.filter(poll::Column::Category.eq(category));
        }

        query
            .order_by_desc(poll::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find polls flagged as trending, newest first.
    pub async fn find_trending(&self) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::Trending.eq(true))
            .order_by_desc(poll::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new poll.
    pub async fn create(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a poll.
    pub async fn update(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write new vote counts if the stored version still equals `expected_version`.
    ///
    /// Bumps the version on success. Returns `false` when another writer got
    /// there first (or the poll no longer exists).
    pub async fn update_votes_if_version(
        &self,
        id: &str,
        votes: &[u64],
        expected_version: i32,
    ) -> AppResult<bool> {
        let result = Poll::update_many()
            .col_expr(poll::Column::Votes, Expr::value(json!(votes)))
            .col_expr(
                poll::Column::Version,
                Expr::col(poll::Column::Version).add(1),
            )
            .filter(poll::Column::Id.eq(id))
            .filter(poll::Column::Version.eq(expected_version))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Delete a poll. Comments cascade.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Poll::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_poll(id: &str, version: i32) -> poll::Model {
        poll::Model {
            id: id.to_string(),
            question: "Tabs or spaces?".to_string(),
            category: "tech".to_string(),
            tags: json!(["editors"]),
            choices: json!(["Tabs", "Spaces"]),
            votes: json!([0, 0]),
            poll_type: poll::PollType::Single,
            close_date: None,
            visibility_public: true,
            trending: false,
            version,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let poll = create_test_poll("p1", 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[poll.clone()]])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.find_by_id("p1").await.unwrap();

        assert!(result.is_some());
        let found = result.unwrap();
        assert_eq!(found.id, "p1");
        assert_eq!(found.poll_type, poll::PollType::Single);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<poll::Model>::new()])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::PollNotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_find_open() {
        let p1 = create_test_poll("p1", 0);
        let p2 = create_test_poll("p2", 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p1, p2]])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.find_open(Some("tech"), Utc::now()).await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_update_votes_if_version_written() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let written = repo.update_votes_if_version("p1", &[1, 0], 0).await.unwrap();

        assert!(written);
    }

    #[tokio::test]
    async fn test_update_votes_if_version_stale() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let written = repo.update_votes_if_version("p1", &[1, 0], 4).await.unwrap();

        assert!(!written);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        assert!(!repo.delete("missing").await.unwrap());
    }
}
