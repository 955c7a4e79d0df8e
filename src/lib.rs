//! Film sink
//!
//! An HTTP endpoint that accepts single film records, validates them and
//! counts every outcome by status. Accepted films are not stored; the sink
//! exists to give upstream producers a realistic target, including a share
//! of simulated `503`s to exercise their retry logic.
//!
//! # Modules
//!
//! - [`types`]: the [`Film`] record and its lenient JSON decoding
//! - [`validation`]: ordered field rules, first violation wins
//! - [`fault`]: injected transient failures
//! - [`metrics`]: status-labelled counters and Prometheus export
//! - [`endpoint`]: request classification into terminal outcomes
//! - [`server`]: axum router, handlers and configuration

pub mod endpoint;
pub mod error;
pub mod fault;
pub mod metrics;
pub mod server;
pub mod types;
pub mod validation;

pub use endpoint::{Endpoint, Outcome};
pub use error::{Result, SinkError, ValidationError};
pub use types::{Film, RequestKind};
