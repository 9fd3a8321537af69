//! `RoadRouter` backed by OSRM's Route API.
//!
//! The [`RoadRouter`] trait is synchronous so the planner stays embeddable in
//! synchronous contexts. This router bridges async HTTP calls to that
//! interface by blocking on a Tokio runtime internally.

use std::time::Duration;

use log::debug;
use promenade_core::{Point, RoadResponse, RoadRouter, RoadRoutingError};
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::osrm::RouteResponse;

/// Error type for [`OsrmRoadRouter`] construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "promenade-routing/0.1";

/// Default OSRM routing profile.
pub const DEFAULT_PROFILE: &str = "foot";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`OsrmRoadRouter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsrmRoadRouterConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Routing profile segment of the URL.
    pub profile: String,
    /// Deadline for each request.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for OsrmRoadRouterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            profile: DEFAULT_PROFILE.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OsrmRoadRouterConfig {
    /// Create a configuration for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Walking geometry from an OSRM server.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the router blocks on its own current-thread
/// runtime. Inside a multi-threaded runtime (detected via
/// [`Handle::try_current()`] and [`RuntimeFlavor::MultiThread`]) it uses that
/// runtime's handle with [`tokio::task::block_in_place`]. Inside a
/// `current_thread` runtime it falls back to its own runtime, which may
/// deadlock if the caller's runtime drives IO this request depends on.
///
/// # Example
///
/// ```no_run
/// use promenade_core::{Point, RoadRouter};
/// use promenade_data::routing::OsrmRoadRouter;
///
/// let router = OsrmRoadRouter::new("http://localhost:5000")?;
/// let response = router.route(&[Point::new(51.5, -0.1), Point::new(51.51, -0.12)])?;
/// let path = response.into_best_path()?;
/// println!("{} m", path.distance_m);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct OsrmRoadRouter {
    client: Client,
    config: OsrmRoadRouterConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for OsrmRoadRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsrmRoadRouter")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl OsrmRoadRouter {
    /// Create a router with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(OsrmRoadRouterConfig::new(base_url))
    }

    /// Create a router with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: OsrmRoadRouterConfig) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &OsrmRoadRouterConfig {
        &self.config
    }

    /// Build the Route API URL for `waypoints`.
    ///
    /// The URL format is
    /// `{base_url}/route/v1/{profile}/{coordinates}?overview=full&geometries=geojson`
    /// where coordinates are semicolon-separated `lon,lat` pairs.
    fn build_route_url(&self, waypoints: &[Point]) -> String {
        let coords = waypoints
            .iter()
            .map(|point| format!("{},{}", point.lon, point.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }

    async fn fetch_route_async(
        &self,
        waypoints: &[Point],
    ) -> Result<RoadResponse, RoadRoutingError> {
        let url = self.build_route_url(waypoints);
        debug!("requesting OSRM route through {} waypoints", waypoints.len());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let route_response: RouteResponse =
            response
                .json()
                .await
                .map_err(|err| RoadRoutingError::Parse {
                    message: err.to_string(),
                })?;

        Ok(route_response.into())
    }

    /// Convert a reqwest error to a `RoadRoutingError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> RoadRoutingError {
        if error.is_timeout() {
            return RoadRoutingError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return RoadRoutingError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        RoadRoutingError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl RoadRouter for OsrmRoadRouter {
    fn route(&self, waypoints: &[Point]) -> Result<RoadResponse, RoadRoutingError> {
        if waypoints.len() < 2 {
            return Err(RoadRoutingError::EmptyInput {
                count: waypoints.len(),
            });
        }

        // block_in_place requires a multi-threaded runtime; current_thread
        // runtimes fall back to the owned runtime.
        let future = self.fetch_route_async(waypoints);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}
