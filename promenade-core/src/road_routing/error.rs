use thiserror::Error;

/// Errors from [`crate::road_routing::RoadRouter::route`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoadRoutingError {
    /// Fewer than two waypoints were provided.
    ///
    /// A path needs a start and a finish. Callers should pre-filter input to
    /// avoid this condition.
    #[error("at least two waypoints are required, got {count}")]
    EmptyInput {
        /// Number of waypoints supplied.
        count: usize,
    },
    /// The request did not complete before the deadline.
    #[error("routing request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured deadline in seconds.
        timeout_secs: u64,
    },
    /// The service answered with an HTTP error status.
    #[error("routing request to {url} failed with HTTP {status}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The service could not be reached.
    #[error("routing request to {url} failed: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The service answered with a status code other than `Ok`.
    #[error("routing service returned {code}: {message}")]
    Service {
        /// Service status code, such as `NoRoute`.
        code: String,
        /// Service message, possibly empty.
        message: String,
    },
    /// The service answer could not be decoded or was incomplete.
    #[error("failed to parse routing response: {message}")]
    Parse {
        /// Error detail.
        message: String,
    },
}
