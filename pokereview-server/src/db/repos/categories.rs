//! Category repository
//!
//! Plain CRUD plus the reverse traversal of the pokemon/category join.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::pokemon::Pokemon;
use crate::db::{DbError, Session};
use crate::models::Text;

/// Category record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>, DbError>;
    async fn get(&self, id: i32) -> Result<Option<Category>, DbError>;
    async fn exists(&self, id: i32) -> Result<bool, DbError>;
    /// Case-insensitive, trimmed name match.
    async fn name_exists(&self, name: &str) -> Result<bool, DbError>;
    /// Pokemon linked to the category, ordered by id.
    async fn list_pokemon(&self, category_id: i32) -> Result<Vec<Pokemon>, DbError>;
    async fn create(&self, name: &Text) -> Result<bool, DbError>;
    async fn update(&self, id: i32, name: &Text) -> Result<bool, DbError>;
    async fn delete(&self, id: i32) -> Result<bool, DbError>;
}

/// PostgreSQL-backed category repository
#[derive(Clone)]
pub struct PgCategoryRepo {
    pool: PgPool,
}

impl PgCategoryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepo {
    async fn list(&self) -> Result<Vec<Category>, DbError> {
        let rows: Vec<Category> = sqlx::query_as("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: i32) -> Result<Option<Category>, DbError> {
        let row: Option<Category> = sqlx::query_as("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn name_exists(&self, name: &str) -> Result<bool, DbError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE UPPER(TRIM(name)) = UPPER(TRIM($1)))",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists.0)
    }

    async fn list_pokemon(&self, category_id: i32) -> Result<Vec<Pokemon>, DbError> {
        let rows: Vec<Pokemon> = sqlx::query_as(
            r#"
            SELECT p.id, p.name, p.birth_date
            FROM pokemon_categories pc
            JOIN pokemon p ON p.id = pc.pokemon_id
            WHERE pc.category_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, name: &Text) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        let id = session
            .insert_returning_id(
                sqlx::query("INSERT INTO categories (name) VALUES ($1) RETURNING id").bind(name.as_str()),
            )
            .await?;
        tracing::debug!(category_id = id, "category created");
        session.save().await
    }

    async fn update(&self, id: i32, name: &Text) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(
                sqlx::query("UPDATE categories SET name = $2 WHERE id = $1")
                    .bind(id)
                    .bind(name.as_str()),
            )
            .await?;
        session.save().await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(sqlx::query("DELETE FROM categories WHERE id = $1").bind(id))
            .await?;
        session.save().await
    }
}
