// src/routes/mod.rs
pub mod gemini;

use crate::state::SharedState;
use axum::{
    Router,
    routing::{get, post},
};
use gemini::generate_handler;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/gemini", post(generate_handler))
        .route("/health", get(|| async { "OK" }))
        .route("/", get(|| async { "Gemini chat backend is running" }))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::very_permissive()),
        )
}
