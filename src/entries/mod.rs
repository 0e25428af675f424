/// Recitation entries
///
/// One row per user per calendar day, accumulated via increments. Every
/// write that changes an entry's count also pushes the signed delta into
/// the global counter so its cache stays equal to the true sum.
use crate::counter::TotalCounter;
use crate::db::models::DuroodEntry;
use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::sync::Arc;

/// One row of a daily leaderboard
#[derive(Debug, serde::Serialize)]
pub struct RankingEntry {
    pub rank: i64,
    pub username: String,
    pub count: i64,
}

pub struct EntryStore {
    pool: SqlitePool,
    counter: Arc<TotalCounter>,
}

impl EntryStore {
    pub fn new(pool: SqlitePool, counter: Arc<TotalCounter>) -> Self {
        Self { pool, counter }
    }

    /// Add `delta` recitations to a user's entry for `date`
    ///
    /// Creates the entry when absent. Returns the new per-day count.
    pub async fn add_count(&self, user_id: &str, date: NaiveDate, delta: i64) -> AppResult<i64> {
        if delta < 1 {
            return Err(AppError::Validation(
                "Count increment must be positive".to_string(),
            ));
        }

        let count: i64 = sqlx::query_scalar(
            "INSERT INTO durood_entry (user_id, entry_date, count) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, entry_date) DO UPDATE SET count = count + ?3
             RETURNING count",
        )
        .bind(user_id)
        .bind(date)
        .bind(delta)
        .fetch_one(&self.pool)
        .await?;

        self.counter.increment(delta).await?;
        Ok(count)
    }

    /// Per-day count for a user, 0 when no entry exists
    pub async fn count_for(&self, user_id: &str, date: NaiveDate) -> AppResult<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT count FROM durood_entry WHERE user_id = ?1 AND entry_date = ?2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Most recent entries for a user, newest first
    pub async fn recent(&self, user_id: &str, limit: i64) -> AppResult<Vec<DuroodEntry>> {
        let entries = sqlx::query_as(
            "SELECT id, user_id, entry_date, count FROM durood_entry
             WHERE user_id = ?1 ORDER BY entry_date DESC LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Top recitation counts for one day, highest first
    ///
    /// Rankings are derived from the entries table on demand rather than
    /// materialized.
    pub async fn rankings(&self, date: NaiveDate, limit: i64) -> AppResult<Vec<RankingEntry>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT u.username, e.count
             FROM durood_entry e JOIN user u ON u.id = e.user_id
             WHERE e.entry_date = ?1 AND e.count > 0
             ORDER BY e.count DESC, u.username
             LIMIT ?2",
        )
        .bind(date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, (username, count))| RankingEntry {
                rank: i as i64 + 1,
                username,
                count,
            })
            .collect())
    }

    /// Consecutive days ending at `today` with a count above zero
    ///
    /// 0 when today has no qualifying entry; otherwise walks backward one
    /// calendar day at a time until the chain breaks.
    pub async fn streak(&self, user_id: &str, today: NaiveDate) -> AppResult<i64> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar(
            "SELECT entry_date FROM durood_entry
             WHERE user_id = ?1 AND count > 0 AND entry_date <= ?2
             ORDER BY entry_date DESC",
        )
        .bind(user_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        let mut streak = 0i64;
        let mut expected = today;
        for date in dates {
            if date != expected {
                break;
            }
            streak += 1;
            expected = match expected.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
        }
        Ok(streak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::TotalBroadcaster;

    async fn setup() -> (EntryStore, Arc<TotalCounter>) {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(
            "CREATE TABLE durood_entry (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                entry_date TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                UNIQUE (user_id, entry_date)
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE total_counter (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE user (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        let counter = Arc::new(TotalCounter::new(
            pool.clone(),
            Arc::new(TotalBroadcaster::new()),
        ));
        (EntryStore::new(pool, counter.clone()), counter)
    }

    async fn add_user(store: &EntryStore, id: &str, username: &str) {
        sqlx::query("INSERT INTO user (id, username) VALUES (?1, ?2)")
            .bind(id)
            .bind(username)
            .execute(&store.pool)
            .await
            .unwrap();
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn increments_accumulate_per_day() {
        let (store, _) = setup().await;
        let today = day(2025, 3, 10);

        assert_eq!(store.add_count("u1", today, 5).await.unwrap(), 5);
        assert_eq!(store.add_count("u1", today, 3).await.unwrap(), 8);
        assert_eq!(store.count_for("u1", today).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn writes_keep_counter_in_sync() {
        let (store, counter) = setup().await;
        let today = day(2025, 3, 10);

        store.add_count("u1", today, 5).await.unwrap();
        store.add_count("u2", today, 7).await.unwrap();
        assert_eq!(counter.total().await.unwrap(), 12);
        assert_eq!(counter.resync().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn non_positive_delta_rejected() {
        let (store, counter) = setup().await;
        let today = day(2025, 3, 10);

        assert!(store.add_count("u1", today, 0).await.is_err());
        assert!(store.add_count("u1", today, -4).await.is_err());
        assert_eq!(counter.total().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rankings_order_by_count() {
        let (store, _) = setup().await;
        let today = day(2025, 3, 10);
        add_user(&store, "u1", "alice").await;
        add_user(&store, "u2", "bob").await;
        add_user(&store, "u3", "carol").await;

        store.add_count("u1", today, 40).await.unwrap();
        store.add_count("u2", today, 100).await.unwrap();
        store.add_count("u3", today, 70).await.unwrap();

        let board = store.rankings(today, 10).await.unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].username, "bob");
        assert_eq!(board[1].username, "carol");
        assert_eq!(board[2].username, "alice");

        let top_two = store.rankings(today, 2).await.unwrap();
        assert_eq!(top_two.len(), 2);
    }

    #[tokio::test]
    async fn streak_counts_consecutive_days() {
        let (store, _) = setup().await;
        let today = day(2025, 3, 10);

        store.add_count("u1", day(2025, 3, 8), 6).await.unwrap();
        store.add_count("u1", day(2025, 3, 9), 8).await.unwrap();
        store.add_count("u1", today, 5).await.unwrap();

        assert_eq!(store.streak("u1", today).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn streak_breaks_on_gap() {
        let (store, _) = setup().await;
        let today = day(2025, 3, 10);

        store.add_count("u1", day(2025, 3, 8), 6).await.unwrap();
        store.add_count("u1", today, 5).await.unwrap();

        assert_eq!(store.streak("u1", today).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn streak_is_zero_without_todays_entry() {
        let (store, _) = setup().await;
        let today = day(2025, 3, 10);

        store.add_count("u1", day(2025, 3, 9), 8).await.unwrap();
        store.add_count("u1", day(2025, 3, 8), 6).await.unwrap();

        assert_eq!(store.streak("u1", today).await.unwrap(), 0);
    }
}
