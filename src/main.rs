use std::{process::exit, sync::Arc};

use reading_rounds::{
    clock::SystemClock,
    round_scheduler::{RoundScheduler, DEFAULT_TICK_INTERVAL_SECONDS},
    round_service::RoundService,
};
use serde::Deserialize;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tokio::{signal, sync::Notify};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Deserialize)]
struct AppConfig {
    database_url: String,
    tick_interval_seconds: Option<u64>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        warn!("Could not load config from .env file: {err}");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(
                    "reading_rounds=info"
                        .parse()
                        .expect("Hard-coded default directive should be correct"),
                )
                .from_env_lossy(),
        )
        .init();

    let app_config = match envy::from_env::<AppConfig>() {
        Ok(config) => config,
        Err(err) => {
            error!("Could not load app config: {err}");
            exit(255);
        }
    };

    let db_pool = match setup_database(&app_config.database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            error!("Could not setup database: {err}");
            exit(255);
        }
    };

    let clock = Arc::new(SystemClock);
    let round_service = Arc::new(RoundService::new(db_pool.clone(), clock.clone()));

    let shutdown_notify = Arc::new(Notify::new());
    let scheduler = RoundScheduler::new(db_pool.clone(), round_service, clock);
    let scheduler_handle = scheduler.start(
        app_config
            .tick_interval_seconds
            .unwrap_or(DEFAULT_TICK_INTERVAL_SECONDS),
        shutdown_notify.clone(),
    );

    match signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(err) => error!("Could not listen for the shutdown signal: {err}"),
    }

    // `notify_one` stores a permit: the signal survives even if the
    // scheduler is mid-sweep and not parked on `notified()` yet.
    shutdown_notify.notify_one();
    if let Err(err) = scheduler_handle.await {
        error!("Scheduler task ended abnormally: {err}");
    }
    db_pool.close().await;
}

#[tracing::instrument(skip(url))]
async fn setup_database(url: &str) -> anyhow::Result<SqlitePool> {
    info!("Connecting to SQLite database at {url}");
    let pool = SqlitePoolOptions::new().connect(url).await?;
    info!("Running migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Done!");
    Ok(pool)
}
