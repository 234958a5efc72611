use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use mentepsi_ledger::billing::PgLedgerStore;
use mentepsi_ledger::config::Config;
use mentepsi_ledger::subscription::PgAccountStore;
use mentepsi_ledger::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mentepsi_ledger=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connecting to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("running migrations")?;

    let state = AppState::new(
        Arc::new(PgLedgerStore::new(pool.clone())),
        Arc::new(PgAccountStore::new(pool)),
        &config,
    );
    state.subscription.warm_cache().await;

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    tracing::info!(addr = %config.bind_address, "Listening for incoming connections");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
