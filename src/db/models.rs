/// Database row models
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub verify_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub verify_token_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An authenticated session
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub access_expires: DateTime<Utc>,
    pub refresh_expires: DateTime<Utc>,
}

/// One user's recitation count for one calendar day
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuroodEntry {
    pub id: i64,
    pub user_id: String,
    pub entry_date: NaiveDate,
    pub count: i64,
}

/// Accumulated points and the level derived from them
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLevel {
    pub user_id: String,
    pub points: i64,
    pub level: i64,
    pub title: String,
}

/// Audit record of a single points change
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsLogEntry {
    pub id: i64,
    pub user_id: String,
    pub amount: i64,
    pub category: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A per-day recitation target
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyGoal {
    pub id: i64,
    pub user_id: String,
    pub goal_date: NaiveDate,
    pub goal: i64,
    pub completed: bool,
}

/// A focused recitation timer run
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    pub id: String,
    pub user_id: String,
    pub session_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_secs: i64,
    pub completed: bool,
}

/// Per-prayer completion flag for one day
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerCompletion {
    pub id: i64,
    pub user_id: String,
    pub prayer_date: NaiveDate,
    pub prayer: String,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// A pending password reset request, keyed by email
#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub email: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
