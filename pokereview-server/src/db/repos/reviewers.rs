//! Reviewer repository

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::reviews::Review;
use crate::db::{DbError, Session};
use crate::models::Text;

/// Reviewer record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Reviewer {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

/// Validated reviewer fields for create/update
#[derive(Debug, Clone)]
pub struct ReviewerInput {
    pub first_name: Text,
    pub last_name: Text,
}

#[async_trait]
pub trait ReviewerRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Reviewer>, DbError>;
    async fn get(&self, id: i32) -> Result<Option<Reviewer>, DbError>;
    async fn exists(&self, id: i32) -> Result<bool, DbError>;
    /// Reviews written by the reviewer.
    async fn list_reviews(&self, reviewer_id: i32) -> Result<Vec<Review>, DbError>;
    async fn create(&self, reviewer: &ReviewerInput) -> Result<bool, DbError>;
    async fn update(&self, id: i32, reviewer: &ReviewerInput) -> Result<bool, DbError>;
    async fn delete(&self, id: i32) -> Result<bool, DbError>;
}

/// PostgreSQL-backed reviewer repository
#[derive(Clone)]
pub struct PgReviewerRepo {
    pool: PgPool,
}

impl PgReviewerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewerRepository for PgReviewerRepo {
    async fn list(&self) -> Result<Vec<Reviewer>, DbError> {
        let rows: Vec<Reviewer> =
            sqlx::query_as("SELECT id, first_name, last_name FROM reviewers ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn get(&self, id: i32) -> Result<Option<Reviewer>, DbError> {
        let row: Option<Reviewer> =
            sqlx::query_as("SELECT id, first_name, last_name FROM reviewers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM reviewers WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn list_reviews(&self, reviewer_id: i32) -> Result<Vec<Review>, DbError> {
        let rows: Vec<Review> = sqlx::query_as(
            r#"
            SELECT id, title, text, rating, pokemon_id, reviewer_id
            FROM reviews
            WHERE reviewer_id = $1
            ORDER BY id
            "#,
        )
        .bind(reviewer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, reviewer: &ReviewerInput) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        let id = session
            .insert_returning_id(
                sqlx::query("INSERT INTO reviewers (first_name, last_name) VALUES ($1, $2) RETURNING id")
                    .bind(reviewer.first_name.as_str())
                    .bind(reviewer.last_name.as_str()),
            )
            .await?;
        tracing::debug!(reviewer_id = id, "reviewer created");
        session.save().await
    }

    async fn update(&self, id: i32, reviewer: &ReviewerInput) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(
                sqlx::query("UPDATE reviewers SET first_name = $2, last_name = $3 WHERE id = $1")
                    .bind(id)
                    .bind(reviewer.first_name.as_str())
                    .bind(reviewer.last_name.as_str()),
            )
            .await?;
        session.save().await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(sqlx::query("DELETE FROM reviewers WHERE id = $1").bind(id))
            .await?;
        session.save().await
    }
}
