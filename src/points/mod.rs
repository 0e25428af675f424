/// Points and leveling engine
///
/// Points accumulate per user; the level and title are derived from the
/// balance and stored alongside it so reads never recompute.
use crate::error::AppResult;
use chrono::Utc;
use sqlx::SqlitePool;

/// Points per level step
const LEVEL_STEP: i64 = 1000;
const MAX_LEVEL: i64 = 5;

const TITLES: [&str; 5] = ["Bronze", "Silver", "Gold", "Diamond", "Platinum"];

/// Derive the level for a points balance, clamped to [1, 5]
pub fn level_for_points(points: i64) -> i64 {
    if points < 0 {
        return 1;
    }
    (points / LEVEL_STEP + 1).min(MAX_LEVEL)
}

/// Title for a level, falling back to the lowest tier when out of range
pub fn title_for_level(level: i64) -> &'static str {
    if level < 1 || level > MAX_LEVEL {
        return TITLES[0];
    }
    TITLES[(level - 1) as usize]
}

pub struct PointsEngine {
    pool: SqlitePool,
}

impl PointsEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Current balance, level and title for a user
    pub async fn status(&self, user_id: &str) -> AppResult<(i64, i64, String)> {
        let row: Option<(i64, i64, String)> = sqlx::query_as(
            "SELECT points, level, title FROM user_level WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.unwrap_or_else(|| (0, 1, TITLES[0].to_string())))
    }

    /// Add points and re-derive level and title
    ///
    /// The balance update is a single upsert so concurrent awards serialize
    /// in the database; level and title follow in the same transaction.
    pub async fn award(
        &self,
        user_id: &str,
        amount: i64,
        category: &str,
        description: &str,
    ) -> AppResult<i64> {
        let mut tx = self.pool.begin().await?;

        let points: i64 = sqlx::query_scalar(
            "INSERT INTO user_level (user_id, points, level, title)
             VALUES (?1, ?2, 1, 'Bronze')
             ON CONFLICT(user_id) DO UPDATE SET points = user_level.points + excluded.points
             RETURNING points",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        let level = level_for_points(points);
        sqlx::query("UPDATE user_level SET level = ?1, title = ?2 WHERE user_id = ?3")
            .bind(level)
            .bind(title_for_level(level))
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.log_change(user_id, amount, category, description).await;
        Ok(points)
    }

    /// Deduct `cost` if the balance covers it
    ///
    /// Returns false without mutating anything when points < cost.
    pub async fn redeem(&self, user_id: &str, cost: i64, name: &str) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let points: Option<i64> = sqlx::query_scalar(
            "UPDATE user_level SET points = points - ?1
             WHERE user_id = ?2 AND points >= ?1
             RETURNING points",
        )
        .bind(cost)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(points) = points else {
            tx.rollback().await?;
            return Ok(false);
        };

        let level = level_for_points(points);
        sqlx::query("UPDATE user_level SET level = ?1, title = ?2 WHERE user_id = ?3")
            .bind(level)
            .bind(title_for_level(level))
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.log_change(user_id, -cost, "redeem", name).await;
        Ok(true)
    }

    /// Append to the points audit log; failures are logged, not raised
    async fn log_change(&self, user_id: &str, amount: i64, category: &str, description: &str) {
        let result = sqlx::query(
            "INSERT INTO points_log (user_id, amount, category, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(user_id)
        .bind(amount)
        .bind(category)
        .bind(description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(user_id, amount, "Failed to record points log entry: {}", e);
        }
    }
}
