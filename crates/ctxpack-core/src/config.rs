use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::image::InsecureRegistries;

/// Build arguments passed to dependency resolution.
///
/// A `None` value declares the argument without overriding it, so the
/// Dockerfile's inline default (if any) applies.
pub type BuildArgs = HashMap<String, Option<String>>;

/// ctxpack.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CtxpackConfig {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Dockerfile path, relative to the workspace
    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,
    /// Build argument templates, keyed by argument name
    #[serde(default)]
    pub args: BTreeMap<String, String>,
    /// Registries contacted over plain HTTP when fetching base images
    #[serde(default)]
    pub insecure_registries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Archive chunks buffered between the tar producer and its reader
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dockerfile: default_dockerfile(),
            args: BTreeMap::new(),
            insecure_registries: Vec::new(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl CtxpackConfig {
    /// Load from ctxpack.toml in the workspace, or return defaults if not found.
    pub fn load(workspace: &Path) -> crate::Result<Self> {
        let config_path = workspace.join("ctxpack.toml");
        let config: Self = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })?
        } else {
            tracing::debug!(workspace = %workspace.display(), "no ctxpack.toml, using defaults");
            Self::default()
        };

        if config.context.channel_capacity == 0 {
            return Err(crate::Error::ZeroChannelCapacity);
        }
        Ok(config)
    }
}

impl BuildConfig {
    /// Build arguments from the config file merged with command-line overrides.
    ///
    /// Overrides win over file entries with the same name.
    pub fn build_args(&self, overrides: &[(String, Option<String>)]) -> BuildArgs {
        let mut args: BuildArgs = self
            .args
            .iter()
            .map(|(k, v)| (k.clone(), Some(v.clone())))
            .collect();
        for (key, value) in overrides {
            args.insert(key.clone(), value.clone());
        }
        args
    }

    pub fn insecure_registries(&self, extra: &[String]) -> InsecureRegistries {
        self.insecure_registries
            .iter()
            .chain(extra)
            .cloned()
            .collect()
    }
}

/// Parse a `KEY=VALUE` or bare `KEY` build argument.
pub fn parse_build_arg(raw: &str) -> crate::Result<(String, Option<String>)> {
    let (key, value) = match raw.split_once('=') {
        Some((key, value)) => (key, Some(value.to_owned())),
        None => (raw, None),
    };
    if key.is_empty() {
        return Err(crate::Error::InvalidBuildArg {
            arg: raw.to_owned(),
            reason: "name must not be empty",
        });
    }
    if key.chars().any(char::is_whitespace) {
        return Err(crate::Error::InvalidBuildArg {
            arg: raw.to_owned(),
            reason: "name must not contain whitespace",
        });
    }
    Ok((key.to_owned(), value))
}

fn default_dockerfile() -> String {
    "Dockerfile".to_owned()
}

fn default_channel_capacity() -> usize {
    16
}
