/// Daily goals and timer sessions
use crate::db::models::{DailyGoal, TimerSession};
use crate::error::{AppError, AppResult};
use crate::points::PointsEngine;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

pub const GOAL_MIN: i64 = 1;
pub const GOAL_MAX: i64 = 10_000;

/// One-time bonus for meeting the daily goal
pub const GOAL_BONUS: i64 = 50;
/// Bonus for finishing a timer session
pub const TIMER_BONUS: i64 = 20;

/// Outcome of a goal completion check
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub completed: bool,
    pub current_count: i64,
    pub target: i64,
    pub remaining: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_points: Option<i64>,
}

pub struct GoalTracker {
    pool: SqlitePool,
    points: Arc<PointsEngine>,
}

impl GoalTracker {
    pub fn new(pool: SqlitePool, points: Arc<PointsEngine>) -> Self {
        Self { pool, points }
    }

    /// Create or update today's goal
    ///
    /// Changing the target resets `completed`; setting the same target is a
    /// no-op. Targets outside [1, 10000] are rejected.
    pub async fn set_goal(&self, user_id: &str, today: NaiveDate, goal: i64) -> AppResult<DailyGoal> {
        if !(GOAL_MIN..=GOAL_MAX).contains(&goal) {
            return Err(AppError::Validation(format!(
                "Goal must be between {} and {}",
                GOAL_MIN, GOAL_MAX
            )));
        }

        let record = sqlx::query_as(
            "INSERT INTO daily_goal (user_id, goal_date, goal, completed) VALUES (?1, ?2, ?3, 0)
             ON CONFLICT(user_id, goal_date) DO UPDATE SET
                 completed = CASE WHEN daily_goal.goal = excluded.goal
                                  THEN daily_goal.completed ELSE 0 END,
                 goal = excluded.goal
             RETURNING id, user_id, goal_date, goal, completed",
        )
        .bind(user_id)
        .bind(today)
        .bind(goal)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Today's goal, if one was set
    pub async fn goal_for(&self, user_id: &str, today: NaiveDate) -> AppResult<Option<DailyGoal>> {
        let record = sqlx::query_as(
            "SELECT id, user_id, goal_date, goal, completed FROM daily_goal
             WHERE user_id = ?1 AND goal_date = ?2",
        )
        .bind(user_id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Compare today's count against the goal, completing it at most once
    ///
    /// The false-to-true transition is a conditional update so two racing
    /// checks cannot both claim the bonus.
    pub async fn check_completion(
        &self,
        user_id: &str,
        today: NaiveDate,
        current_count: i64,
    ) -> AppResult<GoalProgress> {
        let goal = self.goal_for(user_id, today).await?.ok_or_else(|| {
            AppError::NotFound("No goal set for today".to_string())
        })?;

        if goal.completed {
            return Ok(GoalProgress {
                completed: true,
                current_count,
                target: goal.goal,
                remaining: 0,
                bonus_points: None,
            });
        }

        if current_count < goal.goal {
            return Ok(GoalProgress {
                completed: false,
                current_count,
                target: goal.goal,
                remaining: goal.goal - current_count,
                bonus_points: None,
            });
        }

        let result = sqlx::query(
            "UPDATE daily_goal SET completed = 1
             WHERE user_id = ?1 AND goal_date = ?2 AND completed = 0",
        )
        .bind(user_id)
        .bind(today)
        .execute(&self.pool)
        .await?;

        let bonus_points = if result.rows_affected() == 1 {
            self.points
                .award(user_id, GOAL_BONUS, "goal", "Daily goal completed")
                .await?;
            Some(GOAL_BONUS)
        } else {
            None
        };

        Ok(GoalProgress {
            completed: true,
            current_count,
            target: goal.goal,
            remaining: 0,
            bonus_points,
        })
    }
}

pub struct TimerTracker {
    pool: SqlitePool,
    points: Arc<PointsEngine>,
}

impl TimerTracker {
    pub fn new(pool: SqlitePool, points: Arc<PointsEngine>) -> Self {
        Self { pool, points }
    }

    /// Begin a timer session for today; multiple per day are allowed
    pub async fn start(
        &self,
        user_id: &str,
        today: NaiveDate,
        duration_secs: i64,
        started_at: DateTime<Utc>,
    ) -> AppResult<TimerSession> {
        if duration_secs < 1 {
            return Err(AppError::Validation(
                "Timer duration must be positive".to_string(),
            ));
        }

        let session = sqlx::query_as(
            "INSERT INTO timer_session
                 (id, user_id, session_date, started_at, completed_at, duration_secs, completed)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, 0)
             RETURNING id, user_id, session_date, started_at, completed_at,
                       duration_secs, completed",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(today)
        .bind(started_at)
        .bind(duration_secs)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// Finish the most recent open session for today and award the bonus
    ///
    /// No open session is a caller error, reported without touching any row.
    pub async fn complete(
        &self,
        user_id: &str,
        today: NaiveDate,
        completed_at: DateTime<Utc>,
    ) -> AppResult<TimerSession> {
        let open: Option<String> = sqlx::query_scalar(
            "SELECT id FROM timer_session
             WHERE user_id = ?1 AND session_date = ?2 AND completed = 0
             ORDER BY started_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await?;

        let Some(session_id) = open else {
            return Err(AppError::NotFound("No active timer session".to_string()));
        };

        // The open-to-completed transition is guarded so two racing
        // completes cannot both claim the same session and its bonus
        let session: Option<TimerSession> = sqlx::query_as(
            "UPDATE timer_session SET completed = 1, completed_at = ?1
             WHERE id = ?2 AND completed = 0
             RETURNING id, user_id, session_date, started_at, completed_at,
                       duration_secs, completed",
        )
        .bind(completed_at)
        .bind(&session_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(session) = session else {
            return Err(AppError::NotFound("No active timer session".to_string()));
        };

        self.points
            .award(user_id, TIMER_BONUS, "timer", "Timer session completed")
            .await?;

        Ok(session)
    }
}
