//! Database error type

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// A uniqueness or foreign-key constraint rejected the write.
    #[error("conflict: {message}")]
    Conflict { message: String },
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() || db.is_foreign_key_violation() {
                let constraint = db.constraint().unwrap_or("unknown constraint");
                return Self::Conflict {
                    message: format!("the change conflicts with existing data ({})", constraint),
                };
            }
        }
        Self::Sqlx(e)
    }
}
