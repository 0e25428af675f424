/// Global recitation counter
///
/// Maintains the cached grand total of all recitation entries in a singleton
/// row. Invariant: `total_counter.total == SUM(durood_entry.count)`. Reads
/// hit the cached row; `resync` recomputes from the entries table.
use crate::broadcast::TotalBroadcaster;
use crate::error::AppResult;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct TotalCounter {
    pool: SqlitePool,
    broadcaster: Arc<TotalBroadcaster>,
    // Held across each write and its publish so emits leave in the order
    // the writes completed
    publish_lock: Mutex<()>,
}

impl TotalCounter {
    pub fn new(pool: SqlitePool, broadcaster: Arc<TotalBroadcaster>) -> Self {
        Self {
            pool,
            broadcaster,
            publish_lock: Mutex::new(()),
        }
    }

    /// Seed the counter row from the entries table if it does not exist
    ///
    /// Idempotent; an existing row is left alone.
    pub async fn initialize(&self) -> AppResult<()> {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT total FROM total_counter WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        if exists.is_none() {
            self.resync().await?;
        }
        Ok(())
    }

    /// Read the cached grand total
    pub async fn total(&self) -> AppResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT total FROM total_counter WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(total.unwrap_or(0))
    }

    /// Add `delta` to the grand total and publish the new value
    ///
    /// Single upsert statement so concurrent increments serialize in the
    /// database instead of racing a read-modify-write.
    pub async fn increment(&self, delta: i64) -> AppResult<i64> {
        let _guard = self.publish_lock.lock().await;

        let total: i64 = sqlx::query_scalar(
            "INSERT INTO total_counter (id, total) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET total = total + ?1
             RETURNING total",
        )
        .bind(delta)
        .fetch_one(&self.pool)
        .await?;

        self.broadcaster.publish(total);
        Ok(total)
    }

    /// Recompute the cached total from the entries table
    ///
    /// Repairs any drift between the cache and the source of truth.
    pub async fn resync(&self) -> AppResult<i64> {
        let _guard = self.publish_lock.lock().await;

        let mut tx = self.pool.begin().await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(count), 0) FROM durood_entry")
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            "INSERT INTO total_counter (id, total) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET total = ?1",
        )
        .bind(total)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(total, "Resynced global counter");
        self.broadcaster.publish(total);
        Ok(total)
    }
}
