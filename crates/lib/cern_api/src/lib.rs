//! # cern_api
//!
//! HTTP API library for Cern.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use cern_core::turn::ConversationService;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{chat, hello};

/// Route paths.
pub mod routes {
    pub const GET_ROOT: &str = "/";
    pub const POST_API_CHAT: &str = "/api/chat";
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Turn handler over the configured store and reply generator.
    pub service: Arc<ConversationService>,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(routes::GET_ROOT, get(hello::liveness))
        .route(routes::POST_API_CHAT, post(chat::chat_handler))
        .layer(cors)
        .with_state(state)
}
