use case_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    session_provider,
};
use sqlx::postgres::PgPoolOptions;
use std::{process, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point: Configuration, Logging, Database (with migrations),
/// Session Provider, and the HTTP Server. Any startup failure is logged and the
/// process exits with status 1.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            // Logging is not initialized yet.
            eprintln!("FATAL: invalid configuration: {err}");
            process::exit(1);
        }
    };

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise debug for this crate and request logs from tower_http.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "case_portal=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (Postgres)
    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to Postgres, check DATABASE_URL");
            process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!(error = %err, "database migrations failed");
        process::exit(1);
    }

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Session Provider
    let http = reqwest::Client::new();
    let sessions = match session_provider(&config, http.clone(), repo.clone()) {
        Ok(sessions) => sessions,
        Err(err) => {
            tracing::error!(error = %err, "no session provider configured");
            process::exit(1);
        }
    };

    // 6. Unified State Assembly
    let port = config.port;
    let app_state = AppState {
        repo,
        sessions,
        config,
        http,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let address = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %address, "failed to bind HTTP listener");
            process::exit(1);
        }
    };

    tracing::info!("Listening on {address}");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{port}/swagger-ui");

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "HTTP server stopped");
        process::exit(1);
    }
}
