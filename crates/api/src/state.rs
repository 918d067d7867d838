//! Shared application state for the Axum API server.

use mindmend_common::config::AppConfig;
use mindmend_engine::dispatcher::Dispatcher;
use mindmend_engine::registry::ConnectionRegistry;
use redis::aio::ConnectionManager;
use sqlx::PgPool;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub redis: ConnectionManager,
    pub config: AppConfig,
    pub registry: ConnectionRegistry,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        redis: ConnectionManager,
        config: AppConfig,
        registry: ConnectionRegistry,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            pool,
            redis,
            config,
            registry,
            dispatcher,
        }
    }
}
