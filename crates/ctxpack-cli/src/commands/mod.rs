mod context;
mod deps;

use std::path::PathBuf;

use ctxpack_core::{BuildArgs, CtxpackConfig, InsecureRegistries, parse_build_arg};

pub use context::context;
pub use deps::deps;

/// Resolver flags shared by every subcommand. They override `ctxpack.toml`.
#[derive(clap::Args)]
pub struct ResolveFlags {
    /// Workspace (build context) directory
    #[arg(long, short = 'w', default_value = ".")]
    pub workspace: PathBuf,
    /// Dockerfile path, relative to the workspace
    #[arg(long, short = 'f')]
    pub dockerfile: Option<PathBuf>,
    /// Build argument (KEY=VALUE, or KEY to use the Dockerfile default)
    #[arg(long = "build-arg", value_name = "KEY[=VALUE]")]
    pub build_args: Vec<String>,
    /// Registry host reachable over plain HTTP
    #[arg(long = "insecure-registry", value_name = "HOST")]
    pub insecure_registries: Vec<String>,
}

/// Flags merged with the workspace configuration.
pub(crate) struct Settings {
    pub workspace: PathBuf,
    pub dockerfile: PathBuf,
    pub build_args: BuildArgs,
    pub insecure_registries: InsecureRegistries,
    pub channel_capacity: usize,
}

impl ResolveFlags {
    pub(crate) fn settings(&self) -> anyhow::Result<Settings> {
        let config = CtxpackConfig::load(&self.workspace)?;

        let overrides = self
            .build_args
            .iter()
            .map(|raw| parse_build_arg(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Settings {
            workspace: self.workspace.clone(),
            dockerfile: self
                .dockerfile
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.build.dockerfile)),
            build_args: config.build.build_args(&overrides),
            insecure_registries: config.build.insecure_registries(&self.insecure_registries),
            channel_capacity: config.context.channel_capacity,
        })
    }
}
