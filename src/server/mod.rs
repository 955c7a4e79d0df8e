//! HTTP surface of the sink
//!
//! - `GET /metrics` - Prometheus metrics
//! - `GET /{key}` - always `[]`
//! - `POST /{key}` - submit one film
//! - anything else on `/{key}` - `405`

pub mod config;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::timeout::TimeoutLayer;

pub use config::{load_config, ServerConfig};
pub use handlers::AppState;

/// Build the router with all endpoints
///
/// The timeout layer is a backstop sized to the read plus write deadlines.
/// A stalled body hits the read deadline first, inside the handler, so it is
/// still answered, counted and logged as a read failure.
pub fn build_router(state: Arc<AppState>) -> Router {
    let request_deadline = state.config.request_deadline();

    Router::new()
        .route("/metrics", get(handlers::metrics))
        .route("/:key", any(handlers::sink))
        .layer(TimeoutLayer::new(request_deadline))
        .with_state(state)
}
