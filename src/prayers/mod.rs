/// Daily prayer completion tracking
use crate::db::models::PrayerCompletion;
use crate::error::{AppError, AppResult};
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;

/// One of the five daily prayers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prayer::Fajr => "fajr",
            Prayer::Dhuhr => "dhuhr",
            Prayer::Asr => "asr",
            Prayer::Maghrib => "maghrib",
            Prayer::Isha => "isha",
        }
    }
}

impl FromStr for Prayer {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fajr" => Ok(Prayer::Fajr),
            "dhuhr" => Ok(Prayer::Dhuhr),
            "asr" => Ok(Prayer::Asr),
            "maghrib" => Ok(Prayer::Maghrib),
            "isha" => Ok(Prayer::Isha),
            other => Err(AppError::Validation(format!(
                "Unknown prayer name: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct PrayerTracker {
    pool: SqlitePool,
}

impl PrayerTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record whether a prayer was completed on a given day
    pub async fn set_status(
        &self,
        user_id: &str,
        date: NaiveDate,
        prayer: Prayer,
        completed: bool,
    ) -> AppResult<PrayerCompletion> {
        let record = sqlx::query_as(
            "INSERT INTO prayer_completion (user_id, prayer_date, prayer, completed, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, prayer_date, prayer) DO UPDATE SET
                 completed = excluded.completed,
                 updated_at = excluded.updated_at
             RETURNING id, user_id, prayer_date, prayer, completed, updated_at",
        )
        .bind(user_id)
        .bind(date)
        .bind(prayer.as_str())
        .bind(completed)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// All recorded prayer statuses for one day
    pub async fn for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<PrayerCompletion>> {
        let records = sqlx::query_as(
            "SELECT id, user_id, prayer_date, prayer, completed, updated_at
             FROM prayer_completion
             WHERE user_id = ?1 AND prayer_date = ?2
             ORDER BY id",
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
