use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use storefront_reports_api::app::{app, AppState};
use storefront_reports_api::auth::JwtKeys;
use storefront_reports_api::config::{self, Backend};
use storefront_reports_api::configuration::ConfigStore;
use storefront_reports_api::crypto::{ConfigCipher, ServerSecret};
use storefront_reports_api::database::{DatabaseManager, MemoryPersistence, PersistencePort, PgPersistence};
use storefront_reports_api::is_development;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and the secrets
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting Storefront Reports API in {:?} mode", config.environment);

    // Both secrets are required; refuse to start without them
    let secret = ServerSecret::from_env().context("configuration encryption secret")?;
    let jwt = JwtKeys::from_env().context("session signing secret")?;

    let persistence: Arc<dyn PersistencePort> = match config.database.backend {
        Backend::Memory => {
            tracing::warn!("Using in-memory persistence; data is lost on restart");
            if is_development!() {
                Arc::new(MemoryPersistence::with_auto_provision())
            } else {
                Arc::new(MemoryPersistence::new())
            }
        }
        Backend::Postgres => {
            let pool = DatabaseManager::pool_from_env(&config.database).context("database pool")?;
            Arc::new(PgPersistence::new(pool))
        }
    };

    let options = config.store.options();
    let state = AppState {
        store: Arc::new(ConfigStore::new(persistence.clone(), ConfigCipher::new(secret), options.clone())),
        persistence,
        jwt: Arc::new(jwt),
        max_rows: config.api.max_rows,
        persistence_timeout: options.persistence_timeout,
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Storefront Reports API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server")?;
    Ok(())
}
