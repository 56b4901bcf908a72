pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::journal::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/ask", post(handlers::handle_ask))
        .route("/api/v1/entries/:date", get(handlers::handle_get_entry))
        .with_state(state)
}
