//! HTTP handlers for the sink
//!
//! Thin adapters between axum and [`Endpoint`]: they pull the method, path,
//! query and body out of the request and hand them over for classification.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::error;

use super::config::ServerConfig;
use crate::endpoint::{Endpoint, Outcome};
use crate::error::{Result, SinkError};
use crate::metrics::SinkMetrics;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    pub endpoint: Endpoint,
    pub config: ServerConfig,
}

impl AppState {
    /// Build state with the fault injector described by `config`
    pub fn new(config: ServerConfig) -> Result<Arc<Self>> {
        let faults = config.fault_injector()?;
        let endpoint = Endpoint::new(Arc::new(SinkMetrics::new()?), faults);
        Ok(Arc::new(Self { endpoint, config }))
    }

    /// Build state around an already assembled endpoint
    pub fn with_endpoint(config: ServerConfig, endpoint: Endpoint) -> Arc<Self> {
        Arc::new(Self { endpoint, config })
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters accepted on `/{key}`
#[derive(Debug, Deserialize)]
pub struct SinkParams {
    /// Free-form caller name, only logged
    #[serde(default)]
    pub name: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.endpoint.metrics().export_http() {
        Ok((body, content_type)) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            error!(error = %e, "Metrics export failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Any method on `/{key}`
pub async fn sink(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    params: Option<Query<SinkParams>>,
    body: Body,
) -> Outcome {
    let name = params.and_then(|Query(p)| p.name);
    let read = read_body(
        body,
        state.config.max_body_bytes,
        state.config.read_timeout(),
    );

    state
        .endpoint
        .handle(&method, uri.path(), name.as_deref(), read)
        .await
}

/// Collect the whole body within the size limit and read deadline
async fn read_body(body: Body, limit: usize, deadline: Duration) -> Result<Bytes> {
    match tokio::time::timeout(deadline, axum::body::to_bytes(body, limit)).await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => Err(SinkError::BodyRead(e.to_string())),
        Err(_) => Err(SinkError::BodyRead(format!(
            "read deadline of {}ms exceeded",
            deadline.as_millis()
        ))),
    }
}
