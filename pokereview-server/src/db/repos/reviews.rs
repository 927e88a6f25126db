//! Review repository
//!
//! `list` and `get` eager-load the reviewed pokemon through a JOIN.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use super::pokemon::Pokemon;
use crate::db::{DbError, Session};
use crate::models::Text;

/// Review record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Review {
    pub id: i32,
    pub title: String,
    pub text: String,
    pub rating: i32,
    pub pokemon_id: i32,
    pub reviewer_id: i32,
    /// Populated by reads that eager-load the pokemon.
    #[sqlx(skip)]
    pub pokemon: Option<Pokemon>,
}

/// Validated, editable review fields
#[derive(Debug, Clone)]
pub struct ReviewContent {
    pub title: Text,
    pub text: Text,
    pub rating: i32,
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// All reviews with their pokemon attached.
    async fn list(&self) -> Result<Vec<Review>, DbError>;
    /// Review with its pokemon attached.
    async fn get(&self, id: i32) -> Result<Option<Review>, DbError>;
    async fn exists(&self, id: i32) -> Result<bool, DbError>;
    async fn list_for_pokemon(&self, pokemon_id: i32) -> Result<Vec<Review>, DbError>;
    async fn create(
        &self,
        content: &ReviewContent,
        pokemon_id: i32,
        reviewer_id: i32,
    ) -> Result<bool, DbError>;
    async fn update(&self, id: i32, content: &ReviewContent) -> Result<bool, DbError>;
    async fn delete(&self, id: i32) -> Result<bool, DbError>;
}

/// PostgreSQL-backed review repository
#[derive(Clone)]
pub struct PgReviewRepo {
    pool: PgPool,
}

impl PgReviewRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const REVIEW_WITH_POKEMON: &str = r#"
    SELECT r.id, r.title, r.text, r.rating, r.pokemon_id, r.reviewer_id,
           p.name AS pokemon_name, p.birth_date AS pokemon_birth_date
    FROM reviews r
    JOIN pokemon p ON p.id = r.pokemon_id
"#;

fn review_with_pokemon(r: &PgRow) -> Review {
    let pokemon_id: i32 = r.get("pokemon_id");
    Review {
        id: r.get("id"),
        title: r.get("title"),
        text: r.get("text"),
        rating: r.get("rating"),
        pokemon_id,
        reviewer_id: r.get("reviewer_id"),
        pokemon: Some(Pokemon {
            id: pokemon_id,
            name: r.get("pokemon_name"),
            birth_date: r.get("pokemon_birth_date"),
        }),
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepo {
    async fn list(&self) -> Result<Vec<Review>, DbError> {
        let rows = sqlx::query(&format!("{REVIEW_WITH_POKEMON} ORDER BY r.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(review_with_pokemon).collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Review>, DbError> {
        let row = sqlx::query(&format!("{REVIEW_WITH_POKEMON} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(review_with_pokemon))
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM reviews WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn list_for_pokemon(&self, pokemon_id: i32) -> Result<Vec<Review>, DbError> {
        let rows: Vec<Review> = sqlx::query_as(
            r#"
            SELECT id, title, text, rating, pokemon_id, reviewer_id
            FROM reviews
            WHERE pokemon_id = $1
            ORDER BY id
            "#,
        )
        .bind(pokemon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(
        &self,
        content: &ReviewContent,
        pokemon_id: i32,
        reviewer_id: i32,
    ) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        let id = session
            .insert_returning_id(
                sqlx::query(
                    r#"
                    INSERT INTO reviews (title, text, rating, pokemon_id, reviewer_id)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id
                    "#,
                )
                .bind(content.title.as_str())
                .bind(content.text.as_str())
                .bind(content.rating)
                .bind(pokemon_id)
                .bind(reviewer_id),
            )
            .await?;
        tracing::debug!(review_id = id, pokemon_id, reviewer_id, "review created");
        session.save().await
    }

    async fn update(&self, id: i32, content: &ReviewContent) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(
                sqlx::query("UPDATE reviews SET title = $2, text = $3, rating = $4 WHERE id = $1")
                    .bind(id)
                    .bind(content.title.as_str())
                    .bind(content.text.as_str())
                    .bind(content.rating),
            )
            .await?;
        session.save().await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(sqlx::query("DELETE FROM reviews WHERE id = $1").bind(id))
            .await?;
        session.save().await
    }
}
