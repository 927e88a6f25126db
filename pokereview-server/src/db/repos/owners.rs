//! Owner repository
//!
//! Listing and single reads JOIN the owner's country in the same query
//! (no N+1); ownership traversals go through `pokemon_owners`.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use super::countries::Country;
use super::pokemon::Pokemon;
use crate::db::{DbError, Session};
use crate::models::Text;

/// Owner record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Owner {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub gym: String,
    pub country_id: i32,
    /// Populated by reads that eager-load the country.
    #[sqlx(skip)]
    pub country: Option<Country>,
}

/// Validated owner fields for create/update
#[derive(Debug, Clone)]
pub struct OwnerInput {
    pub first_name: Text,
    pub last_name: Text,
    pub gym: Text,
    pub country_id: i32,
}

#[async_trait]
pub trait OwnerRepository: Send + Sync {
    /// All owners with their country attached.
    async fn list(&self) -> Result<Vec<Owner>, DbError>;
    /// Owner with their country attached.
    async fn get(&self, id: i32) -> Result<Option<Owner>, DbError>;
    async fn exists(&self, id: i32) -> Result<bool, DbError>;
    /// Pokemon owned by the owner.
    async fn list_pokemon(&self, owner_id: i32) -> Result<Vec<Pokemon>, DbError>;
    /// Owners of the pokemon.
    async fn list_for_pokemon(&self, pokemon_id: i32) -> Result<Vec<Owner>, DbError>;
    async fn create(&self, owner: &OwnerInput) -> Result<bool, DbError>;
    async fn update(&self, id: i32, owner: &OwnerInput) -> Result<bool, DbError>;
    async fn delete(&self, id: i32) -> Result<bool, DbError>;
}

/// PostgreSQL-backed owner repository
#[derive(Clone)]
pub struct PgOwnerRepo {
    pool: PgPool,
}

impl PgOwnerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const OWNER_WITH_COUNTRY: &str = r#"
    SELECT o.id, o.first_name, o.last_name, o.gym, o.country_id, c.name AS country_name
    FROM owners o
    JOIN countries c ON c.id = o.country_id
"#;

fn owner_with_country(r: &PgRow) -> Owner {
    let country_id: i32 = r.get("country_id");
    Owner {
        id: r.get("id"),
        first_name: r.get("first_name"),
        last_name: r.get("last_name"),
        gym: r.get("gym"),
        country_id,
        country: Some(Country {
            id: country_id,
            name: r.get("country_name"),
        }),
    }
}

#[async_trait]
impl OwnerRepository for PgOwnerRepo {
    async fn list(&self) -> Result<Vec<Owner>, DbError> {
        let rows = sqlx::query(&format!("{OWNER_WITH_COUNTRY} ORDER BY o.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(owner_with_country).collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Owner>, DbError> {
        let row = sqlx::query(&format!("{OWNER_WITH_COUNTRY} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(owner_with_country))
    }

    async fn exists(&self, id: i32) -> Result<bool, DbError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM owners WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn list_pokemon(&self, owner_id: i32) -> Result<Vec<Pokemon>, DbError> {
        let rows: Vec<Pokemon> = sqlx::query_as(
            r#"
            SELECT p.id, p.name, p.birth_date
            FROM pokemon_owners po
            JOIN pokemon p ON p.id = po.pokemon_id
            WHERE po.owner_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_for_pokemon(&self, pokemon_id: i32) -> Result<Vec<Owner>, DbError> {
        let rows: Vec<Owner> = sqlx::query_as(
            r#"
            SELECT o.id, o.first_name, o.last_name, o.gym, o.country_id
            FROM pokemon_owners po
            JOIN owners o ON o.id = po.owner_id
            WHERE po.pokemon_id = $1
            ORDER BY o.id
            "#,
        )
        .bind(pokemon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, owner: &OwnerInput) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        let id = session
            .insert_returning_id(
                sqlx::query(
                    r#"
                    INSERT INTO owners (first_name, last_name, gym, country_id)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(owner.first_name.as_str())
                .bind(owner.last_name.as_str())
                .bind(owner.gym.as_str())
                .bind(owner.country_id),
            )
            .await?;
        tracing::debug!(owner_id = id, country_id = owner.country_id, "owner created");
        session.save().await
    }

    async fn update(&self, id: i32, owner: &OwnerInput) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(
                sqlx::query(
                    r#"
                    UPDATE owners
                    SET first_name = $2, last_name = $3, gym = $4, country_id = $5
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(owner.first_name.as_str())
                .bind(owner.last_name.as_str())
                .bind(owner.gym.as_str())
                .bind(owner.country_id),
            )
            .await?;
        session.save().await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbError> {
        let mut session = Session::begin(&self.pool).await?;
        session
            .execute(sqlx::query("DELETE FROM owners WHERE id = $1").bind(id))
            .await?;
        session.save().await
    }
}
