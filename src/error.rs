//! Error types for the sink

use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for the sink
#[derive(Error, Debug)]
pub enum SinkError {
    /// Payload is not a JSON film object
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// Film decoded but broke a field rule
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Simulated backend instability
    #[error("service temporarily unavailable")]
    Transient,

    /// Request body could not be read
    #[error("failed to read request body: {0}")]
    BodyRead(String),

    /// Method other than GET or POST
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Metrics registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    /// HTTP status a request-level error is answered with
    pub fn status_code(&self) -> StatusCode {
        match self {
            SinkError::Decode(_) | SinkError::Validation(_) => StatusCode::BAD_REQUEST,
            SinkError::Transient => StatusCode::SERVICE_UNAVAILABLE,
            SinkError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            SinkError::BodyRead(_)
            | SinkError::Configuration(_)
            | SinkError::Metrics(_)
            | SinkError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller gets the diagnostic echoed back.
    ///
    /// Client faults are explained; server faults are answered with an
    /// empty body.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            SinkError::Decode(_) | SinkError::Validation(_) | SinkError::UnsupportedMethod(_)
        )
    }
}

/// Field rule violations, reported in check order
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Title was empty
    #[error("title is required")]
    MissingTitle,

    /// Year outside the film era
    #[error("year must be between {min} and {max} (inclusive), got {year}")]
    YearOutOfRange { year: i64, min: i64, max: i64 },

    /// Popularity outside the percentage scale
    #[error("popularity must be between 0 and 100 (inclusive), got {0}")]
    PopularityOutOfRange(f64),

    /// Awards not one of the accepted answers
    #[error("awards must be \"Yes\" or \"No\", got {0:?}")]
    InvalidAwards(String),

    /// Image name without a known picture extension
    #[error("image value doesn't match the regexp {pattern:?}: {value}")]
    ImagePattern { pattern: &'static str, value: String },

    /// Text field carrying a replacement character
    #[error("value for {field} contains an invalid character at position {offset}: {value}")]
    InvalidCharacter {
        field: &'static str,
        offset: usize,
        value: String,
    },
}

impl ValidationError {
    /// Name of the field the rule applies to
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingTitle => "title",
            ValidationError::YearOutOfRange { .. } => "year",
            ValidationError::PopularityOutOfRange(_) => "popularity",
            ValidationError::InvalidAwards(_) => "awards",
            ValidationError::ImagePattern { .. } => "image",
            ValidationError::InvalidCharacter { field, .. } => *field,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SinkError>;
