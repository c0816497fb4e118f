use photogram::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: loads configuration, initializes logging, connects to and migrates
/// the database, then serves HTTP until the process is stopped.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let mut config = AppConfig::load();

    // The first CLI argument, when given, overrides PORT.
    if let Some(arg) = std::env::args().nth(1) {
        config.port = arg
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: port argument must be a number, got {arg:?}"));
    }

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "photogram=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (Postgres)
    let db_timeout = Duration::from_secs(config.db_timeout_secs);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(db_timeout)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to apply database migrations.");

    let repo = Arc::new(PostgresRepository::new(pool, db_timeout)) as RepositoryState;

    // 5. Router and Server Startup
    let port = config.port;
    let app = create_router(AppState::new(repo, config));

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: Failed to bind {addr}: {e}"));

    tracing::info!("Listening on {}", addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{}/swagger-ui", port);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
    }
}
