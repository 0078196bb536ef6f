use std::time::Duration;

use ctxpack_core::{ImageConfigFetcher, ImageFetchError, InsecureRegistries};

use crate::docker::DockerError;
use crate::executor::{DockerExecutor, RealExecutor};
use crate::registry::{ImageRegistry, OciRegistry};

/// Upper bound on a single registry lookup.
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a single `docker image inspect`.
pub const DEFAULT_DAEMON_TIMEOUT: Duration = Duration::from_secs(10);

/// Image metadata client, parameterized over the executor and registry for
/// testability.
///
/// Asks the local docker daemon first and falls back to an anonymous
/// registry pull when the daemon cannot answer.
pub struct ImageClient<E: DockerExecutor = RealExecutor, R: ImageRegistry = OciRegistry> {
    executor: E,
    registry: R,
    registry_fallback: bool,
    daemon_timeout: Duration,
    registry_timeout: Duration,
}

impl ImageClient<RealExecutor, OciRegistry> {
    pub fn new() -> Self {
        Self::with_executor(RealExecutor)
    }
}

impl Default for ImageClient<RealExecutor, OciRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DockerExecutor> ImageClient<E, OciRegistry> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            executor,
            registry: OciRegistry::new(),
            registry_fallback: true,
            daemon_timeout: DEFAULT_DAEMON_TIMEOUT,
            registry_timeout: DEFAULT_REGISTRY_TIMEOUT,
        }
    }
}

impl<E: DockerExecutor, R: ImageRegistry> ImageClient<E, R> {
    /// Replace the registry the daemon falls back to.
    pub fn with_registry<R2: ImageRegistry>(self, registry: R2) -> ImageClient<E, R2> {
        ImageClient {
            executor: self.executor,
            registry,
            registry_fallback: self.registry_fallback,
            daemon_timeout: self.daemon_timeout,
            registry_timeout: self.registry_timeout,
        }
    }

    /// Only consult the local daemon.
    pub fn without_registry(mut self) -> Self {
        self.registry_fallback = false;
        self
    }

    pub fn with_daemon_timeout(mut self, timeout: Duration) -> Self {
        self.daemon_timeout = timeout;
        self
    }

    pub fn with_registry_timeout(mut self, timeout: Duration) -> Self {
        self.registry_timeout = timeout;
        self
    }

    async fn inspect(&self, image: &str) -> Result<String, DockerError> {
        let inspect_args = args([
            "image",
            "inspect",
            "--format",
            "{{json .Config.OnBuild}}",
            image,
        ]);
        let inspect = self.executor.exec(&inspect_args);
        match tokio::time::timeout(self.daemon_timeout, inspect).await {
            Ok(result) => result,
            Err(_elapsed) => Err(DockerError::TimedOut {
                after: self.daemon_timeout,
            }),
        }
    }

    async fn registry_onbuild(
        &self,
        image: &str,
        insecure_registries: &InsecureRegistries,
    ) -> Result<Vec<String>, ImageFetchError> {
        match tokio::time::timeout(
            self.registry_timeout,
            self.registry.onbuild_triggers(image, insecure_registries),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(ImageFetchError::TimedOut {
                image: image.to_owned(),
                after: self.registry_timeout,
            }),
        }
    }
}

impl<E: DockerExecutor, R: ImageRegistry> ImageConfigFetcher for ImageClient<E, R> {
    async fn onbuild_triggers(
        &self,
        image: &str,
        insecure_registries: &InsecureRegistries,
    ) -> Result<Vec<String>, ImageFetchError> {
        match self.inspect(image).await {
            Ok(output) => return parse_inspect_output(image, &output),
            Err(e) if !self.registry_fallback => {
                return Err(ImageFetchError::Daemon {
                    image: image.to_owned(),
                    detail: e.to_string(),
                });
            }
            Err(e) if e.is_missing_image() => {
                tracing::debug!(image, "image not found in local daemon, querying registry");
            }
            Err(e) => {
                tracing::debug!(image, error = %e, "docker daemon unavailable, querying registry");
            }
        }

        self.registry_onbuild(image, insecure_registries).await
    }
}

/// Parse `{{json .Config.OnBuild}}` output: `null` or a JSON string array.
fn parse_inspect_output(image: &str, output: &str) -> Result<Vec<String>, ImageFetchError> {
    serde_json::from_str::<Option<Vec<String>>>(output.trim())
        .map(Option::unwrap_or_default)
        .map_err(|e| ImageFetchError::MalformedConfig {
            image: image.to_owned(),
            source: Box::new(e),
        })
}

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}
