/// Database layer for the Durood Tracker service
pub mod models;

use crate::error::AppResult;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Create a SQLite connection pool
pub async fn create_pool(database_path: &Path) -> AppResult<SqlitePool> {
    let url = format!("sqlite://{}", database_path.display());

    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Run pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> AppResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(sqlx::Error::from)?;
    tracing::info!("Database migrations complete");
    Ok(())
}

/// Verify database connectivity
pub async fn test_connection(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_pool_answers_queries() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        test_connection(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn file_backed_pool_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");

        let pool = create_pool(&path).await.unwrap();
        test_connection(&pool).await.unwrap();
        assert!(path.exists());
    }
}
