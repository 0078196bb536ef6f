//! Base-image metadata lookup for ctxpack.
//!
//! [`ImageClient`] implements [`ctxpack_core::ImageConfigFetcher`]: the
//! local docker daemon is asked first, then the image's registry.

pub mod client;
pub mod docker;
pub mod executor;
pub mod registry;

pub use client::{DEFAULT_DAEMON_TIMEOUT, DEFAULT_REGISTRY_TIMEOUT, ImageClient};
pub use docker::DockerError;
pub use executor::{DockerExecutor, RealExecutor};
pub use registry::{ImageRegistry, OciRegistry};
