//! # SolarEdge monitoring API client
//!
//! [`SolarEdgeClient`] performs authenticated GET requests against the
//! monitoring service for a single site and returns the parsed JSON body.
//! Callers describe what they want with a [`RemoteOperation`] and talk to the
//! client through the [`RemoteAdapter`] trait, so tests can swap in a fake.
//!
//! ```no_run
//! use solaredge_api::{RemoteAdapter, RemoteOperation, SolarEdgeClient};
//!
//! # async fn example() -> Result<(), solaredge_api::TransportError> {
//! let client = SolarEdgeClient::new("YOUR_API_KEY", 123_456)?;
//! let overview = client.call(RemoteOperation::SiteOverview).await?;
//! println!("{overview:#}");
//! # Ok(())
//! # }
//! ```

mod adapter;
mod client;
mod error;
mod operation;

pub use adapter::RemoteAdapter;
pub use client::{DEFAULT_BASE_URL, SolarEdgeClient};
pub use error::TransportError;
pub use operation::{RemoteOperation, SystemUnits, TimeUnit};
