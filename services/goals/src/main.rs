use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod error;
mod jwt;
mod middleware;
mod models;
mod rate_limiter;
mod repositories;
mod routes;
mod session;
mod settings;
mod state;
mod validation;
mod views;

use common::database;

use crate::{settings::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting goal tracker");

    let config = AppConfig::load()?;
    if config.uses_development_secret() {
        warn!("Using the development session secret, set GOALS__SESSION__SECRET in production");
    }

    // Initialize database connection pool
    let pool = database::init_pool(&config.database).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::migrate(&pool).await?;

    let app_state = AppState::new(pool, &config)?;

    if app_state.user_repository.count().await? == 0 {
        info!("No registered users yet, visitors will be sent to the registration page");
    }

    // Start the web server
    let app = routes::create_router(app_state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Goal tracker listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
