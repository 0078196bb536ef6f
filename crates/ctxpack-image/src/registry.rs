//! Anonymous registry lookups of image configs.

use std::collections::HashMap;
use std::sync::Arc;

use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::secrets::RegistryAuth;
use oci_distribution::{Client, Reference};
use serde::Deserialize;
use tokio::sync::Mutex;

use ctxpack_core::{ImageFetchError, InsecureRegistries};

/// The subset of an OCI image config the resolver reads.
#[derive(Debug, Default, Deserialize)]
struct ImageConfigFile {
    #[serde(default)]
    config: Option<ContainerConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerConfig {
    #[serde(rename = "OnBuild", default)]
    on_build: Option<Vec<String>>,
}

/// Registry side of an image-config lookup.
///
/// Production code uses [`OciRegistry`]; tests substitute their own.
#[allow(async_fn_in_trait)]
pub trait ImageRegistry: Send + Sync {
    /// Pull the config of `image` and return its ONBUILD triggers.
    async fn onbuild_triggers(
        &self,
        image: &str,
        insecure_registries: &InsecureRegistries,
    ) -> Result<Vec<String>, ImageFetchError>;
}

/// Anonymous OCI registry access.
///
/// One `Client` is built per distinct insecure-registry set and reused, so
/// connections and bearer tokens carry over between lookups.
#[derive(Default)]
pub struct OciRegistry {
    clients: Mutex<HashMap<Vec<String>, Arc<Client>>>,
}

impl OciRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn client(&self, insecure_registries: &InsecureRegistries) -> Arc<Client> {
        let mut hosts: Vec<String> = insecure_registries.iter().cloned().collect();
        hosts.sort();

        let mut clients = self.clients.lock().await;
        Arc::clone(
            clients
                .entry(hosts)
                .or_insert_with_key(|hosts| Arc::new(Client::new(client_config(hosts)))),
        )
    }
}

impl ImageRegistry for OciRegistry {
    /// Multi-platform indexes resolve to the current platform.
    async fn onbuild_triggers(
        &self,
        image: &str,
        insecure_registries: &InsecureRegistries,
    ) -> Result<Vec<String>, ImageFetchError> {
        let reference = image
            .parse::<Reference>()
            .map_err(|e| ImageFetchError::InvalidReference {
                image: image.to_owned(),
                detail: e.to_string(),
            })?;

        let client = self.client(insecure_registries).await;
        let (_manifest, digest, config) = client
            .pull_manifest_and_config(&reference, &RegistryAuth::Anonymous)
            .await
            .map_err(|e| ImageFetchError::Registry {
                image: image.to_owned(),
                detail: e.to_string(),
            })?;

        tracing::debug!(image, registry = reference.resolve_registry(), %digest, "pulled image config");
        parse_onbuild(image, &config)
    }
}

fn client_config(insecure_hosts: &[String]) -> ClientConfig {
    let protocol = if insecure_hosts.is_empty() {
        ClientProtocol::Https
    } else {
        ClientProtocol::HttpsExcept(insecure_hosts.to_vec())
    };
    ClientConfig {
        protocol,
        ..Default::default()
    }
}

/// ONBUILD triggers of a raw image config document.
pub fn parse_onbuild(image: &str, config: &str) -> Result<Vec<String>, ImageFetchError> {
    let file: ImageConfigFile =
        serde_json::from_str(config).map_err(|e| ImageFetchError::MalformedConfig {
            image: image.to_owned(),
            source: Box::new(e),
        })?;
    Ok(file.config.and_then(|c| c.on_build).unwrap_or_default())
}
