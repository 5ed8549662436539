//! This module defines the interfaces the engine uses to reach the metrics
//! backend and the dashboard renderer.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::{
    http_client::HttpClientPoolError,
    models::{Reading, SubstanceId},
};

/// Errors raised while fetching a reading.
#[derive(Error, Debug)]
pub enum MetricsSourceError {
    /// The backend answered, but not with the structure we expect.
    #[error("Malformed metrics response for substance {substance_id}: {reason}")]
    MalformedResponse {
        /// The substance that was queried.
        substance_id: SubstanceId,
        /// What was wrong with the response.
        reason: String,
    },

    /// The backend reported a failed query.
    #[error("Metrics query for substance {substance_id} failed: {message}")]
    QueryFailed {
        /// The substance that was queried.
        substance_id: SubstanceId,
        /// The error returned by the backend.
        message: String,
    },

    /// The request could not be completed.
    #[error("Metrics request error: {0}")]
    Request(#[from] reqwest_middleware::Error),

    /// The query template could not be rendered.
    #[error("Failed to build metrics query: {0}")]
    Query(String),

    /// No HTTP client could be created.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpClientPoolError),
}

/// A source of current concentrations, keyed by substance id.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Fetches the current concentration of one substance as a percentage of
    /// its limit.
    async fn fetch(&self, substance_id: SubstanceId) -> Result<Reading, MetricsSourceError>;
}

/// Errors raised while capturing a snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The request could not be completed.
    #[error("Snapshot request error: {0}")]
    Request(#[from] reqwest_middleware::Error),

    /// The body could not be read.
    #[error("Failed to read snapshot body: {0}")]
    Body(#[from] reqwest::Error),

    /// The renderer answered with a non-success status.
    #[error("Snapshot renderer returned status {0}")]
    Status(u16),

    /// The renderer answered with something that is not an image.
    #[error("Snapshot renderer returned non-image content: {0}")]
    NotAnImage(String),

    /// No HTTP client could be created.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpClientPoolError),
}

/// Produces a rendered image of the pollution dashboard.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Captures the dashboard as image bytes.
    async fn capture(&self) -> Result<Vec<u8>, SnapshotError>;
}
