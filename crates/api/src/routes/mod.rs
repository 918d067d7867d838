pub mod bookings;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod ws;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(notifications::router())
        .merge(bookings::router())
        .merge(messages::router())
        .merge(ws::router())
        .with_state(state)
}
