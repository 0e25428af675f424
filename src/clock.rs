/// Canonical application time
///
/// "Today" for streaks, goals, timers and prayer logs is always computed in
/// one fixed UTC offset. Mixing offsets between call sites would shift the
/// calendar-day boundary and corrupt streak counts.
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

#[derive(Debug, Clone, Copy)]
pub struct Clock {
    offset: FixedOffset,
}

impl Clock {
    /// Create a clock with a fixed offset east of UTC, in minutes
    pub fn new(tz_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(tz_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        Self { offset }
    }

    /// Current instant in the application offset
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Current calendar date in the application offset
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Project an arbitrary instant onto the application calendar
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }
}
