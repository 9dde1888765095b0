//! Registry of known Steam accounts, stored in PostgreSQL via tokio-postgres

use async_trait::async_trait;
use deadpool_postgres::{Pool, PoolError};
use steamstats_core::{Result, StatsError};

#[derive(Debug)]
pub enum DbError {
    Pool(PoolError),
    Postgres(tokio_postgres::Error),
}

impl From<PoolError> for DbError {
    fn from(e: PoolError) -> Self {
        DbError::Pool(e)
    }
}

impl From<tokio_postgres::Error> for DbError {
    fn from(e: tokio_postgres::Error) -> Self {
        DbError::Postgres(e)
    }
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::Pool(e) => write!(f, "Pool error: {}", e),
            DbError::Postgres(e) => write!(f, "Postgres error: {}", e),
        }
    }
}

impl From<DbError> for StatsError {
    fn from(e: DbError) -> Self {
        StatsError::Database(e.to_string())
    }
}

/// Set of registered account ids.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn exists(&self, steam_id: &str) -> Result<bool>;

    /// Returns `false` when the id was already registered.
    async fn insert(&self, steam_id: &str) -> Result<bool>;

    /// All ids, ordered.
    async fn list(&self) -> Result<Vec<String>>;
}

pub async fn init_schema(pool: &Pool) -> std::result::Result<(), DbError> {
    let client = pool.get().await?;
    client
        .batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                steam_id TEXT PRIMARY KEY NOT NULL
            );
            "#,
        )
        .await?;
    Ok(())
}

pub struct PgRegistry {
    pool: Pool,
}

impl PgRegistry {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Registry for PgRegistry {
    async fn exists(&self, steam_id: &str) -> Result<bool> {
        let client = self.pool.get().await.map_err(DbError::from)?;
        let row = client
            .query_opt("SELECT 1 FROM users WHERE steam_id = $1", &[&steam_id])
            .await
            .map_err(DbError::from)?;
        Ok(row.is_some())
    }

    async fn insert(&self, steam_id: &str) -> Result<bool> {
        let client = self.pool.get().await.map_err(DbError::from)?;
        // The primary key serializes concurrent registrations of the same id.
        let inserted = client
            .execute(
                "INSERT INTO users (steam_id) VALUES ($1) ON CONFLICT (steam_id) DO NOTHING",
                &[&steam_id],
            )
            .await
            .map_err(DbError::from)?;
        Ok(inserted == 1)
    }

    async fn list(&self) -> Result<Vec<String>> {
        let client = self.pool.get().await.map_err(DbError::from)?;
        let rows = client
            .query("SELECT steam_id FROM users ORDER BY steam_id", &[])
            .await
            .map_err(DbError::from)?;
        Ok(rows.into_iter().map(|row| row.get("steam_id")).collect())
    }
}

#[cfg(test)]
pub use memory::MemoryRegistry;
