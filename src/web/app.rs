use super::{MAX_REQUEST_SIZE_BYTES, SharedPipeline, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::Level;

pub fn create_app(pipeline: SharedPipeline) -> Router {
    Router::new()
        .route("/render", post(handlers::render))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_SIZE_BYTES))
        // The preview front-end is served from a different origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)))
        .with_state(pipeline)
}
