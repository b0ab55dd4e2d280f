use jokes_app::config::Config;
use jokes_app::database::{create_pool, run_migrations};
use jokes_app::store::{JokeStore, MemoryJokeStore, PgJokeStore};
use jokes_app::{AppState, create_app};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jokes_app=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("JWT_SECRET must be set: {}", e))?;
    tracing::info!("Configuration loaded successfully");

    let store: Arc<dyn JokeStore> = match &config.database_url {
        Some(database_url) => {
            let db = create_pool(database_url, config.db_max_connections).await?;
            tracing::info!("Database connection pool created");

            run_migrations(&db).await?;
            tracing::info!("Database migrations completed");

            Arc::new(PgJokeStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, jokes are kept in memory only");
            Arc::new(MemoryJokeStore::new())
        }
    };

    // Create application state
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };

    // Create application
    let app = create_app(state);

    // Create listener
    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    tracing::info!("Server listening on {}:{}", config.host, config.port);

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
