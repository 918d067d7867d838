//! MindMend API server binary entrypoint.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use mindmend_common::config::AppConfig;
use mindmend_common::db::create_pool;
use mindmend_common::redis_pool::create_redis_pool;
use mindmend_engine::dispatcher::Dispatcher;
use mindmend_engine::registry::ConnectionRegistry;
use mindmend_reminder::sweep::ReminderSweep;

use mindmend_api::routes::create_router;
use mindmend_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "mindmend_api=debug,mindmend_engine=debug,mindmend_reminder=debug,tower_http=debug",
            )
        }))
        .init();

    tracing::info!("Starting MindMend API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Create Redis connection
    let redis = create_redis_pool(&config.redis_url).await?;
    tracing::info!("Redis connection established");

    // Connection registry and dispatcher are shared between the HTTP layer
    // and the reminder sweep so background pushes reach live sockets.
    let registry = ConnectionRegistry::new();
    let dispatcher = Dispatcher::new(registry.clone());

    let mut sweep = ReminderSweep::new(
        pool.clone(),
        redis.clone(),
        dispatcher.clone(),
        config.reminder_poll_interval_secs,
        config.reminder_lead_minutes,
    );
    tokio::spawn(async move { sweep.run().await });

    // Build application state
    let state = AppState::new(pool, redis, config.clone(), registry, dispatcher);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
