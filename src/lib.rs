use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod config;
pub mod cravat_client;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;

#[cfg(test)]
pub(crate) mod test_support;

use cravat_client::VariantService;
use crate::http::sse::{SseSessions, SSE_MESSAGE_PATH, SSE_PATH};

#[derive(Clone)]
pub struct AppState {
    pub default_annotators: Arc<[String]>,
    pub variant_service: Arc<dyn VariantService>,
    pub sse_sessions: SseSessions,
}

impl AppState {
    pub fn new(default_annotators: Vec<String>, variant_service: Arc<dyn VariantService>) -> Self {
        Self {
            default_annotators: Arc::from(default_annotators),
            variant_service,
            sse_sessions: SseSessions::default(),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .route(SSE_PATH, get(http::sse::sse_connect))
        .route(SSE_MESSAGE_PATH, post(http::sse::sse_message))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
