//! Base-image metadata lookup.
//!
//! The resolver needs exactly one thing from a base image: its ONBUILD
//! trigger list. [`ImageConfigFetcher`] is that seam. The production
//! implementation lives in `ctxpack-image`; tests substitute fakes.

use std::collections::HashSet;

/// Registry hosts that may be contacted over plain HTTP.
pub type InsecureRegistries = HashSet<String>;

/// Looks up the ONBUILD triggers embedded in an image's config.
///
/// Implementations are constructed once by the caller and reused across
/// resolutions. Timeouts and retries belong to the implementation.
#[allow(async_fn_in_trait)]
pub trait ImageConfigFetcher: Send + Sync {
    /// Returns the raw ONBUILD instruction strings (without the `ONBUILD`
    /// keyword) for `image`. An image without triggers yields an empty list.
    async fn onbuild_triggers(
        &self,
        image: &str,
        insecure_registries: &InsecureRegistries,
    ) -> Result<Vec<String>, ImageFetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageFetchError {
    #[error("invalid image reference {image:?}: {detail}")]
    InvalidReference { image: String, detail: String },

    #[error("docker daemon lookup failed for {image}: {detail}")]
    Daemon { image: String, detail: String },

    #[error("registry lookup failed for {image}: {detail}")]
    Registry { image: String, detail: String },

    #[error("image config for {image} is malformed")]
    MalformedConfig {
        image: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("lookup for {image} timed out after {after:?}")]
    TimedOut {
        image: String,
        after: std::time::Duration,
    },
}
