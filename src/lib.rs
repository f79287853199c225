// Library crate for SnowBees
// Exports modules for use by the server binary and tests

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod session;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{create_bee, drop_bee, list_bees, preview_bee, test_bee};
use crate::state::AppState;

/// Build the application router with the given state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Hello, SnowBees!" }))
        // Create New Bee
        .route("/api/bees", post(create_bee))
        .route("/api/bees/preview", post(preview_bee))
        .route("/api/bees/test", post(test_bee))
        // List All Bees
        .route("/api/bees", get(list_bees))
        .route("/api/bees/drop", post(drop_bee))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
