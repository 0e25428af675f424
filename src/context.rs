/// Application context and dependency injection
use crate::{
    account::AccountManager,
    broadcast::TotalBroadcaster,
    clock::Clock,
    config::AppConfig,
    counter::TotalCounter,
    db,
    entries::EntryStore,
    error::AppResult,
    goals::{GoalTracker, TimerTracker},
    mailer::Mailer,
    points::PointsEngine,
    prayers::PrayerTracker,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: SqlitePool,
    pub clock: Clock,
    pub accounts: Arc<AccountManager>,
    pub mailer: Arc<Mailer>,
    pub broadcaster: Arc<TotalBroadcaster>,
    pub counter: Arc<TotalCounter>,
    pub entries: Arc<EntryStore>,
    pub points: Arc<PointsEngine>,
    pub goals: Arc<GoalTracker>,
    pub timers: Arc<TimerTracker>,
    pub prayers: Arc<PrayerTracker>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let pool = db::create_pool(&config.storage.database).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let config = Arc::new(config);
        let clock = Clock::new(config.time.tz_offset_minutes);

        let accounts = Arc::new(AccountManager::new(pool.clone(), config.clone()));
        let mailer = Arc::new(Mailer::new(config.email.clone())?);

        // The broadcaster is created here and injected everywhere it is
        // needed; its lifetime is the lifetime of the process.
        let broadcaster = Arc::new(TotalBroadcaster::new());
        let counter = Arc::new(TotalCounter::new(pool.clone(), broadcaster.clone()));
        counter.initialize().await?;

        let entries = Arc::new(EntryStore::new(pool.clone(), counter.clone()));
        let points = Arc::new(PointsEngine::new(pool.clone()));
        let goals = Arc::new(GoalTracker::new(pool.clone(), points.clone()));
        let timers = Arc::new(TimerTracker::new(pool.clone(), points.clone()));
        let prayers = Arc::new(PrayerTracker::new(pool.clone()));

        Ok(Self {
            config,
            db: pool,
            clock,
            accounts,
            mailer,
            broadcaster,
            counter,
            entries,
            points,
            goals,
            timers,
            prayers,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &AppConfig) -> AppResult<()> {
        let dir = &config.storage.data_directory;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
