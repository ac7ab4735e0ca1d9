//! Error types for scraping, ingestion and catalog lookups.

use thiserror::Error;

/// Errors raised while talking to remote sources or persisting their results.
#[derive(Debug, Error)]
pub enum EtlError {
    /// A remote source answered with a non-success HTTP status.
    #[error("HTTP {status} from {source_name}: {message}")]
    Http {
        source_name: String,
        status: u16,
        message: String,
    },

    /// The remote source returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// The requested entity was not found at the remote source.
    #[error("not found: {entity} at {source_name}")]
    NotFound { entity: String, source_name: String },

    /// A response from a remote source could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// Transport-level failure propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An error propagated from the catalog store.
    #[error("database error: {0}")]
    Database(#[from] repertoire_core::Error),

    #[error("unknown rubric {0:?} (available: {1})")]
    UnknownRubric(String, String),
}

impl EtlError {
    /// Returns `true` when the error is transient and the request may
    /// succeed if retried: rate limiting, gateway/server failures, timeouts
    /// and connection errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Http { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` when the error indicates the entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias for ETL results.
pub type EtlResult<T> = std::result::Result<T, EtlError>;
