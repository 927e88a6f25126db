//! Write session: one transaction, one commit
//!
//! Every repository write opens a `Session`, queues its statements and ends
//! with [`Session::save`], which commits and reports whether any row changed.
//! A session that affected nothing is rolled back and reported as `false`.

use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::DbError;

pub struct Session {
    tx: Transaction<'static, Postgres>,
    affected: u64,
}

impl Session {
    /// Open a transaction on the pool.
    pub async fn begin(pool: &PgPool) -> Result<Self, DbError> {
        Ok(Self {
            tx: pool.begin().await?,
            affected: 0,
        })
    }

    /// Run a statement inside the session, returning the rows it touched.
    pub async fn execute(&mut self, query: Query<'_, Postgres, PgArguments>) -> Result<u64, DbError> {
        let done = query.execute(&mut *self.tx).await?;
        self.affected += done.rows_affected();
        Ok(done.rows_affected())
    }

    /// Run an `INSERT ... RETURNING id` statement and return the new id.
    pub async fn insert_returning_id(
        &mut self,
        query: Query<'_, Postgres, PgArguments>,
    ) -> Result<i32, DbError> {
        let row = query.fetch_one(&mut *self.tx).await?;
        self.affected += 1;
        Ok(row.try_get("id")?)
    }

    /// Commit pending writes. Returns `false` (after rolling back) when
    /// nothing was affected.
    pub async fn save(self) -> Result<bool, DbError> {
        if self.affected == 0 {
            self.tx.rollback().await?;
            tracing::warn!("commit affected no rows");
            return Ok(false);
        }

        self.tx.commit().await?;
        Ok(true)
    }
}
