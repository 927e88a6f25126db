//! Schema migrations
//!
//! Idempotent; safe to run on every startup.

use sqlx::PgPool;

use super::DbError;

/// Ordered (name, DDL) pairs; parents before the tables that reference them.
pub const STATEMENTS: &[(&str, &str)] = &[
    (
        "categories",
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    ),
    (
        "categories_name_key",
        "CREATE UNIQUE INDEX IF NOT EXISTS categories_name_key ON categories (UPPER(TRIM(name)))",
    ),
    (
        "countries",
        r#"
        CREATE TABLE IF NOT EXISTS countries (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    ),
    (
        "countries_name_key",
        "CREATE UNIQUE INDEX IF NOT EXISTS countries_name_key ON countries (UPPER(TRIM(name)))",
    ),
    (
        "owners",
        r#"
        CREATE TABLE IF NOT EXISTS owners (
            id SERIAL PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            gym TEXT NOT NULL,
            country_id INTEGER NOT NULL REFERENCES countries(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "pokemon",
        r#"
        CREATE TABLE IF NOT EXISTS pokemon (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            birth_date DATE NOT NULL
        )
        "#,
    ),
    (
        "pokemon_name_key",
        "CREATE UNIQUE INDEX IF NOT EXISTS pokemon_name_key ON pokemon (UPPER(TRIM(name)))",
    ),
    (
        "reviewers",
        r#"
        CREATE TABLE IF NOT EXISTS reviewers (
            id SERIAL PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL
        )
        "#,
    ),
    (
        "reviews",
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id SERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            text TEXT NOT NULL,
            rating INTEGER NOT NULL,
            pokemon_id INTEGER NOT NULL REFERENCES pokemon(id) ON DELETE CASCADE,
            reviewer_id INTEGER NOT NULL REFERENCES reviewers(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "reviews_pokemon_idx",
        "CREATE INDEX IF NOT EXISTS reviews_pokemon_idx ON reviews (pokemon_id)",
    ),
    (
        "reviews_reviewer_idx",
        "CREATE INDEX IF NOT EXISTS reviews_reviewer_idx ON reviews (reviewer_id)",
    ),
    (
        "pokemon_categories",
        r#"
        CREATE TABLE IF NOT EXISTS pokemon_categories (
            pokemon_id INTEGER NOT NULL REFERENCES pokemon(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            PRIMARY KEY (pokemon_id, category_id)
        )
        "#,
    ),
    (
        "pokemon_owners",
        r#"
        CREATE TABLE IF NOT EXISTS pokemon_owners (
            pokemon_id INTEGER NOT NULL REFERENCES pokemon(id) ON DELETE CASCADE,
            owner_id INTEGER NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
            PRIMARY KEY (pokemon_id, owner_id)
        )
        "#,
    ),
];

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running schema migrations...");

    for &(name, sql) in STATEMENTS {
        tracing::debug!(migration = name, "applying");
        sqlx::query(sql).execute(pool).await?;
    }

    tracing::info!(count = STATEMENTS.len(), "Schema migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_tables_follow_their_parents() {
        let position = |name: &str| STATEMENTS.iter().position(|(n, _)| *n == name).unwrap();

        assert!(position("pokemon_categories") > position("pokemon"));
        assert!(position("pokemon_categories") > position("categories"));
        assert!(position("pokemon_owners") > position("owners"));
        assert!(position("owners") > position("countries"));
        assert!(position("reviews") > position("reviewers"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_are_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url, &crate::db::PoolSettings::default())
            .await
            .expect("pool creation failed");

        run(&pool).await.expect("first run");
        run(&pool).await.expect("second run");
    }
}
