//! Request classification for the sink
//!
//! [`Endpoint`] owns the policy that turns one request into one terminal
//! [`Outcome`]:
//!
//! ```text
//! Received ──┬── GET ──────────────────────────────────────────▶ Listed (200)
//!            ├── POST ─┬─ fault drawn ─────────────────────────▶ 503
//!            │         ├─ body read fails ─────────────────────▶ 500
//!            │         ├─ decode / validation fails ───────────▶ 400
//!            │         └─ ok ──────────────────────────────────▶ Created (201)
//!            └── other ────────────────────────────────────────▶ 405
//! ```
//!
//! Every GET and POST outcome is counted once under its final status and
//! every request is logged once. Nothing is retried here; retrying a 503 is
//! up to the caller.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, info};

use crate::error::{Result, SinkError};
use crate::fault::FaultInjector;
use crate::metrics::SinkMetrics;
use crate::types::{Film, RequestKind};
use crate::validation;

/// Body returned to every listing request
pub const EMPTY_LISTING: &str = "[]\n";

/// Terminal state of one request
#[derive(Debug)]
pub enum Outcome {
    /// GET answered with an empty listing
    Listed,
    /// POST accepted
    Created,
    /// Request failed; the error decides the status
    Failed(SinkError),
}

impl Outcome {
    /// HTTP status of this outcome
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::Listed => StatusCode::OK,
            Outcome::Created => StatusCode::CREATED,
            Outcome::Failed(e) => e.status_code(),
        }
    }

    /// Plain-text body, if the outcome carries one
    pub fn body(&self) -> Option<String> {
        match self {
            Outcome::Listed => Some(EMPTY_LISTING.to_string()),
            Outcome::Created => None,
            Outcome::Failed(e) if e.is_client_fault() => Some(format!("{}\n", e)),
            Outcome::Failed(_) => None,
        }
    }

    /// Error behind a failed outcome
    pub fn error(&self) -> Option<&SinkError> {
        match self {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.body() {
            Some(body) => (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                body,
            )
                .into_response(),
            None => status.into_response(),
        }
    }
}

/// Decode and validate one posted film
pub fn ingest(body: &[u8]) -> Result<Film> {
    let film = Film::from_slice(body)?;
    validation::validate(&film)?;
    Ok(film)
}

/// Classifies requests and records their outcomes
#[derive(Debug, Clone)]
pub struct Endpoint {
    metrics: Arc<SinkMetrics>,
    faults: FaultInjector,
}

impl Endpoint {
    /// Create an endpoint over a shared counter registry and fault injector
    pub fn new(metrics: Arc<SinkMetrics>, faults: FaultInjector) -> Self {
        Self { metrics, faults }
    }

    /// Counter registry outcomes are recorded in
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Route a request by method.
    ///
    /// `read_body` is only polled for POSTs that survive fault injection.
    pub async fn handle<F>(
        &self,
        method: &Method,
        path: &str,
        name: Option<&str>,
        read_body: F,
    ) -> Outcome
    where
        F: Future<Output = Result<Bytes>>,
    {
        if *method == Method::GET {
            self.list(path, name)
        } else if *method == Method::POST {
            self.submit(path, read_body).await
        } else {
            self.reject_method(method, path)
        }
    }

    /// Answer a listing request
    pub fn list(&self, path: &str, name: Option<&str>) -> Outcome {
        info!(
            method = "GET",
            path = %path,
            name = name.unwrap_or_default(),
            "GET request"
        );
        self.finish(RequestKind::Get, Outcome::Listed)
    }

    /// Accept or reject a posted film
    pub async fn submit<F>(&self, path: &str, read_body: F) -> Outcome
    where
        F: Future<Output = Result<Bytes>>,
    {
        if self.faults.should_fail() {
            error!(method = "POST", path = %path, "return 503");
            return self.finish(RequestKind::Post, Outcome::Failed(SinkError::Transient));
        }

        let body = match read_body.await {
            Ok(body) => body,
            Err(e) => {
                error!(method = "POST", path = %path, error = %e, "return 500");
                return self.finish(RequestKind::Post, Outcome::Failed(e));
            }
        };

        match ingest(&body) {
            Ok(film) => {
                info!(
                    method = "POST",
                    path = %path,
                    title = %film.title,
                    body = %String::from_utf8_lossy(&body),
                    "POST request"
                );
                self.finish(RequestKind::Post, Outcome::Created)
            }
            Err(e) => {
                error!(
                    method = "POST",
                    path = %path,
                    error = %e,
                    body = %String::from_utf8_lossy(&body),
                    "return 400"
                );
                self.finish(RequestKind::Post, Outcome::Failed(e))
            }
        }
    }

    /// Refuse a method the sink does not serve. Not counted.
    pub fn reject_method(&self, method: &Method, path: &str) -> Outcome {
        error!(method = %method, path = %path, "unsupported request");
        Outcome::Failed(SinkError::UnsupportedMethod(method.to_string()))
    }

    fn finish(&self, kind: RequestKind, outcome: Outcome) -> Outcome {
        self.metrics.record(kind, outcome.status());
        outcome
    }
}
