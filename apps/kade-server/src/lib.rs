//! # Kade Server
//!
//! HTTP/JSON API of the Kade POS backend.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  client ──► TraceLayer ──► CorsLayer ──► /api router                    │
//! │                                            │                            │
//! │                              require_auth (if auth.require_auth)        │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                              handler(State<AppState>, ApiJson<..>)      │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                              kade_db repository ──► SQLite              │
//! │                                            │                            │
//! │                         Json<T>  or  ApiError ──► {"error": "..."}      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the complete router: `/api/...` plus `/health`.
pub fn build_router(state: AppState) -> Router {
    let mut api = Router::new()
        .merge(routes::products::router())
        .merge(routes::customers::router())
        .merge(routes::sales::router())
        .merge(routes::dashboard::router());

    if state.config.auth.require_auth {
        api = api.route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));
    }

    // Added after the auth layer: login must stay reachable, and /auth/me
    // checks its own token.
    let api = api.merge(routes::auth::router());

    let cors = if state.config.server.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .nest("/api", api)
        .route("/health", get(routes::health::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
