/// Background maintenance jobs
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use crate::context::AppContext;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::expired_credential_cleanup_job(Arc::clone(&self)));
        tokio::spawn(Self::counter_resync_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Cleanup expired sessions and reset tokens (runs every hour)
    async fn expired_credential_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(3600));

        loop {
            interval.tick().await;

            // The manager logs what it removed
            if let Err(e) = scheduler.context.accounts.cleanup_expired().await {
                error!("Failed to cleanup expired credentials: {}", e);
            }
        }
    }

    /// Reconcile the cached global total against the entries table
    ///
    /// The counter is maintained incrementally; a daily recompute corrects
    /// any drift from crashes between an entry write and its counter update.
    async fn counter_resync_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(24 * 3600));
        // The first tick fires immediately; initialization already seeded
        // the counter, so skip it
        interval.tick().await;

        loop {
            interval.tick().await;

            match scheduler.context.counter.resync().await {
                Ok(total) => info!(total, "Counter resync complete"),
                Err(e) => error!("Failed to resync counter: {}", e),
            }
        }
    }
}
