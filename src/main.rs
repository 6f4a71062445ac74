use library_lending::{
    adapters::http::{HttpAuthProvider, HttpCatalog},
    adapters::postgres::{PostgresFavoriteStore, PostgresLoanStore, PostgresWaitlistStore},
    api::{handlers::AppState, router::create_router},
    application::ServiceDependencies,
    config::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(policy = ?config.lending.policy, "Starting lending service");

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    // Initialize adapters
    let catalog = Arc::new(HttpCatalog::new(
        &config.catalog.base_url,
        config.catalog.timeout(),
    )?);
    let auth = Arc::new(HttpAuthProvider::new(
        &config.auth.url,
        &config.auth.anon_key,
        config.auth.timeout(),
    )?);

    // Create service dependencies
    let service_deps = ServiceDependencies {
        catalog,
        auth,
        loan_store: Arc::new(PostgresLoanStore::new(pool.clone())),
        favorite_store: Arc::new(PostgresFavoriteStore::new(pool.clone())),
        waitlist_store: Arc::new(PostgresWaitlistStore::new(pool)),
        loan_policy: config.lending.policy,
    };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
