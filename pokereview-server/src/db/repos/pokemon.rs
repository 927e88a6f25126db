//! Pokemon repository
//!
//! The busiest repository: it owns both join tables.
//! - create: pokemon row + every initial category link, one commit
//! - update: row fields + full category set replacement, one commit
//! - rating: AVG over reviews, 0 when there are none

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};

use super::categories::Category;
use crate::db::{DbError, Session};
use crate::models::{CategoryIds, Text};

/// Pokemon record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Pokemon {
    pub id: i32,
    pub name: String,
    pub birth_date: NaiveDate,
}

/// Validated pokemon fields for create/update
#[derive(Debug, Clone)]
pub struct PokemonInput {
    pub name: Text,
    pub birth_date: NaiveDate,
}

#[async_trait]
pub trait PokemonRepository: Send + Sync {
    /// All pokemon ordered by id.
    async fn list(&self) -> Result<Vec<Pokemon>, DbError>;
    async fn get(&self, id: i32) -> Result<Option<Pokemon>, DbError>;
    /// Case-insensitive, trimmed name lookup.
    async fn get_by_name(&self, name: &str) -> Result<Option<Pokemon>, DbError>;
    async fn exists(&self, id: i32) -> Result<bool, DbError>;
    async fn name_exists(&self, name: &str) -> Result<bool, DbError>;
    /// Mean review rating; exactly 0 without reviews.
    async fn rating(&self, pokemon_id: i32) -> Result<f64, DbError>;
    /// Categories the pokemon belongs to, ordered by id.
    async fn list_categories(&self, pokemon_id: i32) -> Result<Vec<Category>, DbError>;
    async fn owner_exists(&self, owner_id: i32, pokemon_id: i32) -> Result<bool, DbError>;
    /// Insert one ownership link.
    async fn add_owner(&self, owner_id: i32, pokemon_id: i32) -> Result<bool, DbError>;
    /// Insert one join row per category id.
    async fn add_categories(&self, pokemon_id: i32, categories: &CategoryIds) -> Result<bool, DbError>;
    /// Remove every category link of the pokemon.
    async fn delete_categories(&self, pokemon_id: i32) -> Result<bool, DbError>;
    async fn create(&self, pokemon: &PokemonInput, categories: &CategoryIds) -> Result<bool, DbError>;
    /// Overwrite fields and replace the whole category set.
    async fn update(
        &self,
        id: i32,
        pokemon: &PokemonInput,
        categories: &CategoryIds,
    ) -> Result<bool, DbError>;
    async fn delete(&self, id: i32) -> Result<bool, DbError>;
}

/// PostgreSQL-backed pokemon repository
#[derive(Clone)]
pub struct PgPokemonRepo {
    pool: PgPool,
}

impl PgPokemonRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn link_categories(
    session: &mut Session,
    pokemon_id: i32,
    categories: &CategoryIds,
) -> Result<(), DbError> {
    for category_id in categories.iter() {
        session
            .execute(
                sqlx::query(
                    r#"
                    INSERT INTO pokemon_categories (pokemon_id, category_id)
                    VALUES ($1, $2)
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(pokemon_id)
                .bind(category_id),
            )
            .await?;
    }
    Ok(())
}

async fn unlink_categories(session: &mut Session, pokemon_id: i32) -> Result<u64, DbError> {
    session
        .execute(sqlx::query("DELETE FROM pokemon_categories WHERE pokemon_id = $1").bind(pokemon_id))
        .await
}

#[async_trait]
impl PokemonRepository for PgPokemonRepo {
    async fn list(&self) -> Result<Vec<Pokemon>, DbError> {
        let rows: Vec<Pokemon> = sqlx::query_as("SELECT id, name, birth_date FROM pokemon ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: i32) -> Result<Option<Pokemon>, DbError> {
        let row: Option<Pokemon> = sqlx::query_as("SELECT id, name, birth_date FROM pokemon WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Pokemon>, DbError> {
        let row: Option<Pokemon> = sqlx::query_as(
            "SELECT id, name, birth_date FROM pokemon WHERE UPPER(TRIM(name)) = UPPER(TRIM($1))",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pokemon WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn name_exists(&self, name: &str) -> Result<bool, DbError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM pokemon WHERE UPPER(TRIM(name)) = UPPER(TRIM($1)))",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists.0)
    }

    async fn rating(&self, pokemon_id: i32) -> Result<f64, DbError> {
        // AVG over an empty set is NULL, hence the COALESCE
        let rating: f64 = sqlx::query_scalar(
            "SELECT COALESCE(AVG(rating)::float8, 0) FROM reviews WHERE pokemon_id = $1",
        )
        .bind(pokemon_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(rating)
    }

    async fn list_categories(&self, pokemon_id: i32) -> Result<Vec<Category>, DbError> {
        let rows: Vec<Category> = sqlx::query_as(
            r#"
            SELECT c.id, c.name
            FROM pokemon_categories pc
            JOIN categories c ON c.id = pc.category_id
            WHERE pc.pokemon_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(pokemon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn owner_exists(&self, owner_id: i32, pokemon_id: i32) -> Result<bool, DbError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM pokemon_owners WHERE owner_id = $1 AND pokemon_id = $2)",
        )
        .bind(owner_id)
        .bind(pokemon_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists.0)
    }

    async fn add_owner(&self, owner_id: i32, pokemon_id: i32) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(
                sqlx::query("INSERT INTO pokemon_owners (pokemon_id, owner_id) VALUES ($1, $2)")
                    .bind(pokemon_id)
                    .bind(owner_id),
            )
            .await?;
        tracing::debug!(owner_id, pokemon_id, "ownership linked");
        session.save().await
    }

    async fn add_categories(&self, pokemon_id: i32, categories: &CategoryIds) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        link_categories(&mut session, pokemon_id, categories).await?;
        session.save().await
    }

    async fn delete_categories(&self, pokemon_id: i32) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        unlink_categories(&mut session, pokemon_id).await?;
        session.save().await
    }

    async fn create(&self, pokemon: &PokemonInput, categories: &CategoryIds) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        let id = session
            .insert_returning_id(
                sqlx::query("INSERT INTO pokemon (name, birth_date) VALUES ($1, $2) RETURNING id")
                    .bind(pokemon.name.as_str())
                    .bind(pokemon.birth_date),
            )
            .await?;
        link_categories(&mut session, id, categories).await?;
        tracing::debug!(pokemon_id = id, categories = categories.len(), "pokemon created");
        session.save().await
    }

    async fn update(
        &self,
        id: i32,
        pokemon: &PokemonInput,
        categories: &CategoryIds,
    ) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        let updated = session
            .execute(
                sqlx::query("UPDATE pokemon SET name = $2, birth_date = $3 WHERE id = $1")
                    .bind(id)
                    .bind(pokemon.name.as_str())
                    .bind(pokemon.birth_date),
            )
            .await?;
        if updated == 0 {
            // Dropping the session rolls the transaction back
            return Ok(false);
        }

        unlink_categories(&mut session, id).await?;
        link_categories(&mut session, id, categories).await?;
        tracing::debug!(pokemon_id = id, categories = categories.len(), "pokemon updated");
        session.save().await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(sqlx::query("DELETE FROM pokemon WHERE id = $1").bind(id))
            .await?;
        session.save().await
    }
}
