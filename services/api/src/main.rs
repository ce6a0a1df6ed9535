use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use api::{ApiConfig, AppState, routes};
use auth::{AuthConfig, AuthService};
use common::database::{DatabaseConfig, health_check, init_pool};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting API service");

    let config = ApiConfig::from_env()?;
    let auth_config = AuthConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let service = AuthService::postgres(pool.clone(), &auth_config);
    let app_state = AppState {
        guard: service.guard().clone(),
        db_pool: Some(pool),
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("API service listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
