//! HTTP road routing through an OSRM server.
//!
//! [`OsrmRoadRouter`] implements [`promenade_core::RoadRouter`] with the OSRM
//! Route service. Each call resolves one walk through all supplied waypoints
//! and returns the service answer unchanged in meaning; degrading to pairwise
//! or straight-line geometry is left to the core resolver.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use promenade_data::routing::{OsrmRoadRouter, OsrmRoadRouterConfig};
//!
//! let config = OsrmRoadRouterConfig::new("http://localhost:5000")
//!     .with_timeout(Duration::from_secs(5))
//!     .with_user_agent("my-app/1.0");
//! let router = OsrmRoadRouter::with_config(config)?;
//! # Ok::<(), promenade_data::routing::ProviderBuildError>(())
//! ```

mod osrm;
mod provider;

pub use provider::{
    DEFAULT_PROFILE, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, OsrmRoadRouter,
    OsrmRoadRouterConfig, ProviderBuildError,
};
