//! PostgreSQL persistence for diagram writes
//!
//! Rows in the `diagrams` table are append-only: every successful POST adds
//! one, nothing updates or reads them back. Schema (managed externally):
//! `diagrams (diagram_xml text, created_at timestamp)`.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Database handle wrapping the connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL
    ///
    /// The pool is capped at a single connection, so concurrent inserts
    /// serialize on it.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Append one diagram row stamped with the database clock
    pub async fn insert_diagram(&self, diagram_xml: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO diagrams (diagram_xml, created_at) VALUES ($1, CURRENT_TIMESTAMP)")
            .bind(diagram_xml)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
