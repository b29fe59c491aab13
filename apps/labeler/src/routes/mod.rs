pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::labels::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Label API
        .route("/api/v1/labels/layout", post(handlers::handle_layout))
        .route("/api/v1/labels/render", post(handlers::handle_render))
        .route("/api/v1/labels/commands", post(handlers::handle_commands))
        .route("/api/v1/labels/print", post(handlers::handle_print))
        .route("/api/v1/assets/:id", get(handlers::handle_get_asset))
        .with_state(state)
}
