//! Outcome counters and Prometheus export
//!
//! One counter family per request kind, labelled by the numeric status the
//! request was answered with:
//!
//! ```text
//! sink_get_total{status="200"}
//! sink_post_total{status="201"|"400"|"500"|"503"}
//! ```
//!
//! The counters live in a registry owned by [`SinkMetrics`] rather than the
//! process-wide default registry, so every server (and every test) gets its
//! own independent set.

use axum::http::StatusCode;
use prometheus::core::Collector;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{Result, SinkError};
use crate::types::RequestKind;

/// Content type of the text exposition format
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Status-labelled request counters
#[derive(Clone)]
pub struct SinkMetrics {
    registry: Registry,
    gets: IntCounterVec,
    posts: IntCounterVec,
}

impl SinkMetrics {
    /// Create and register both counter families
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let gets = IntCounterVec::new(
            Opts::new("sink_get_total", "The total get calls"),
            &["status"],
        )?;
        let posts = IntCounterVec::new(
            Opts::new("sink_post_total", "The total post calls"),
            &["status"],
        )?;

        registry.register(Box::new(gets.clone()))?;
        registry.register(Box::new(posts.clone()))?;

        Ok(Self {
            registry,
            gets,
            posts,
        })
    }

    fn family(&self, kind: RequestKind) -> &IntCounterVec {
        match kind {
            RequestKind::Get => &self.gets,
            RequestKind::Post => &self.posts,
        }
    }

    /// Count one handled request
    pub fn record(&self, kind: RequestKind, status: StatusCode) {
        self.family(kind)
            .with_label_values(&[status.as_str()])
            .inc();
    }

    /// Current value of one counter.
    ///
    /// Reads the collected samples instead of going through
    /// `with_label_values`, which would register an empty series for a
    /// status that was never recorded.
    pub fn count(&self, kind: RequestKind, status: StatusCode) -> u64 {
        let label = status.as_str();
        self.family(kind)
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == "status" && pair.get_value() == label)
            })
            .map(|metric| metric.get_counter().get_value() as u64)
            .unwrap_or(0)
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];

        encoder.encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| {
            SinkError::Metrics(prometheus::Error::Msg(format!(
                "Metrics contain invalid UTF-8: {}",
                e
            )))
        })
    }

    /// Export metrics as HTTP response body with correct content type
    pub fn export_http(&self) -> Result<(String, &'static str)> {
        Ok((self.export()?, PROMETHEUS_CONTENT_TYPE))
    }
}

impl std::fmt::Debug for SinkMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkMetrics").finish_non_exhaustive()
    }
}
