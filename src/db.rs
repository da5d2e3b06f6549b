use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::config::AppConfig;

/// Open the pool described by `config`. The database file is created if missing.
pub async fn connect(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("parse DATABASE_URL {}", config.database_url))?
        .create_if_missing(true)
        .foreign_keys(true)
        // Writers queue on the lock instead of failing with SQLITE_BUSY.
        .busy_timeout(Duration::from_secs(5));

    // An in-memory database lives exactly as long as its connection.
    let in_memory = config.database_url.contains(":memory:");
    let mut pool = SqlitePoolOptions::new().max_connections(if in_memory {
        1
    } else {
        config.db_max_connections
    });
    if in_memory {
        pool = pool
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    }

    pool.connect_with(options)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    tracing::debug!("migrations applied");
    Ok(())
}
