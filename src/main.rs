/// Durood Tracker
///
/// A recitation tracking service with daily goals, streaks, prayer logs,
/// a gamified points system and a live global counter.

mod account;
mod api;
mod auth;
mod broadcast;
mod clock;
mod config;
mod context;
mod counter;
mod db;
mod entries;
mod error;
mod goals;
mod jobs;
mod mailer;
mod points;
mod prayers;
mod server;

use config::AppConfig;
use context::AppContext;
use error::AppResult;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "durood_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;
    let ctx = Arc::new(ctx);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ____                             __   ______                __
   / __ \__  ___________  ____  ____/ /  /_  __/________ ______/ /_____  _____
  / / / / / / / ___/ __ \/ __ \/ __  /    / / / ___/ __ `/ ___/ //_/ _ \/ ___/
 / /_/ / /_/ / /  / /_/ / /_/ / /_/ /    / / / /  / /_/ / /__/ ,< /  __/ /
/_____/\__,_/_/   \____/\____/\__,_/    /_/ /_/   \__,_/\___/_/|_|\___/_/

        Durood Tracker v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
