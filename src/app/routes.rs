use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::commands::{self, AppState};

/// Enregistre la liste unique des routes HTTP exposées.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(commands::home::home))
        .route("/health", get(commands::diagnostics::health))
        .route("/splice-videos", post(commands::splice::splice_videos))
        .fallback(commands::home::not_found)
        .method_not_allowed_fallback(commands::home::method_not_allowed)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
