//! Country repository

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::owners::Owner;
use crate::db::{DbError, Session};
use crate::models::Text;

/// Country record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Country {
    pub id: i32,
    pub name: String,
}

#[async_trait]
pub trait CountryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Country>, DbError>;
    async fn get(&self, id: i32) -> Result<Option<Country>, DbError>;
    /// Country of the given owner, if the owner exists.
    async fn get_by_owner(&self, owner_id: i32) -> Result<Option<Country>, DbError>;
    /// Owners living in the country (country not attached).
    async fn list_owners(&self, country_id: i32) -> Result<Vec<Owner>, DbError>;
    async fn exists(&self, id: i32) -> Result<bool, DbError>;
    async fn name_exists(&self, name: &str) -> Result<bool, DbError>;
    async fn create(&self, name: &Text) -> Result<bool, DbError>;
    async fn update(&self, id: i32, name: &Text) -> Result<bool, DbError>;
    async fn delete(&self, id: i32) -> Result<bool, DbError>;
}

/// PostgreSQL-backed country repository
#[derive(Clone)]
pub struct PgCountryRepo {
    pool: PgPool,
}

impl PgCountryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CountryRepository for PgCountryRepo {
    async fn list(&self) -> Result<Vec<Country>, DbError> {
        let rows: Vec<Country> = sqlx::query_as("SELECT id, name FROM countries ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: i32) -> Result<Option<Country>, DbError> {
        let row: Option<Country> = sqlx::query_as("SELECT id, name FROM countries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_owner(&self, owner_id: i32) -> Result<Option<Country>, DbError> {
        let row: Option<Country> = sqlx::query_as(
            r#"
            SELECT c.id, c.name
            FROM owners o
            JOIN countries c ON c.id = o.country_id
            WHERE o.id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_owners(&self, country_id: i32) -> Result<Vec<Owner>, DbError> {
        let rows: Vec<Owner> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, gym, country_id
            FROM owners
            WHERE country_id = $1
            ORDER BY id
            "#,
        )
        .bind(country_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM countries WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn name_exists(&self, name: &str) -> Result<bool, DbError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM countries WHERE UPPER(TRIM(name)) = UPPER(TRIM($1)))",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists.0)
    }

    async fn create(&self, name: &Text) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        let id = session
            .insert_returning_id(
                sqlx::query("INSERT INTO countries (name) VALUES ($1) RETURNING id").bind(name.as_str()),
            )
            .await?;
        tracing::debug!(country_id = id, "country created");
        session.save().await
    }

    async fn update(&self, id: i32, name: &Text) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(
                sqlx::query("UPDATE countries SET name = $2 WHERE id = $1")
                    .bind(id)
                    .bind(name.as_str()),
            )
            .await?;
        session.save().await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(sqlx::query("DELETE FROM countries WHERE id = $1").bind(id))
            .await?;
        session.save().await
    }
}
