//! Dockerfile dependency resolution.
//!
//! ```text
//! read + parse Dockerfile
//!   → substitute build arguments (in place)
//!   → fetch ONBUILD triggers of external base images (prepended)
//!   → extract COPY/ADD sources
//!   → expand literal paths and globs
//!   → walk directories, apply .dockerignore
//!   → + Dockerfile, − .dockerignore, sorted
//! ```

use std::path::{Path, PathBuf};

use ctxpack_core::{BuildArgs, ImageConfigFetcher, InsecureRegistries};

use crate::args::{self, ArgError};
use crate::copy::{self, CopyError};
use crate::expand::{self, ExpandError};
use crate::ignore::{IGNORE_FILE, PatternError, PatternSet};
use crate::instruction::{self, ParseError};
use crate::onbuild;
use crate::paths;
use crate::walk::{self, WalkError};

/// Source of environment variables for build-argument templates.
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves the workspace files a Dockerfile build depends on.
///
/// Holds the image-metadata collaborator so one instance can serve many
/// resolutions; each call keeps its own instruction list and scope.
pub struct DependencyResolver<F: ImageConfigFetcher> {
    fetcher: F,
    env: EnvLookup,
}

impl<F: ImageConfigFetcher> DependencyResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            env: Box::new(process_env),
        }
    }

    /// Replace the environment used to render build-argument templates.
    pub fn with_env(mut self, env: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Sorted workspace-relative paths the build of `dockerfile` depends on.
    ///
    /// The Dockerfile itself is always included, even when ignored; the
    /// ignore file never is.
    pub async fn dependencies(
        &self,
        workspace: &Path,
        dockerfile: &Path,
        build_args: &BuildArgs,
        insecure_registries: &InsecureRegistries,
    ) -> Result<Vec<String>, ResolveError> {
        // The prefix check compares against the workspace as the caller spelled it.
        let abs_dockerfile = normalize_dockerfile_path(workspace, dockerfile).map_err(|e| {
            ResolveError::NormalizeDockerfile {
                path: dockerfile.to_path_buf(),
                source: e,
            }
        })?;
        let workspace = paths::absolute(workspace).map_err(|e| ResolveError::Workspace {
            path: workspace.to_path_buf(),
            source: e,
        })?;

        let deps = self
            .read_dockerfile(&workspace, &abs_dockerfile, build_args, insecure_registries)
            .await?;

        let excludes = PatternSet::load(&workspace).map_err(ResolveError::Ignore)?;
        let mut files =
            walk::walk_workspace(&workspace, &excludes, &deps).map_err(ResolveError::Walk)?;

        // The daemon needs the Dockerfile even when it is .dockerignored.
        let dockerfile_dep = match abs_dockerfile.strip_prefix(&workspace) {
            Ok(rel) => paths::to_slash(rel),
            // arch-lint: allow(no-error-swallowing) reason="a Dockerfile outside the workspace is listed by its absolute path"
            Err(_) => abs_dockerfile.to_string_lossy().into_owned(),
        };
        files.insert(dockerfile_dep);
        files.remove(IGNORE_FILE);

        tracing::debug!(
            dockerfile = %abs_dockerfile.display(),
            count = files.len(),
            "resolved dockerfile dependencies"
        );
        Ok(files.into_iter().collect())
    }

    /// COPY/ADD sources of the Dockerfile, expanded against the workspace
    /// but not yet walked or filtered.
    async fn read_dockerfile(
        &self,
        workspace: &Path,
        abs_dockerfile: &Path,
        build_args: &BuildArgs,
        insecure_registries: &InsecureRegistries,
    ) -> Result<Vec<String>, ResolveError> {
        let source = std::fs::read_to_string(abs_dockerfile).map_err(|e| {
            ResolveError::ReadDockerfile {
                path: abs_dockerfile.to_path_buf(),
                source: e,
            }
        })?;

        let mut instructions = instruction::parse(&source).map_err(ResolveError::Parse)?;

        args::expand_build_args(&mut instructions, build_args, &*self.env)
            .map_err(ResolveError::BuildArgs)?;

        let mut combined =
            onbuild::onbuild_instructions(&self.fetcher, &instructions, insecure_registries)
                .await
                .map_err(ResolveError::Onbuild)?;
        combined.extend(instructions);

        let copied = copy::copied_files(&combined).map_err(ResolveError::Copy)?;

        expand::expand_paths(workspace, &copied).map_err(ResolveError::Expand)
    }
}

/// Absolute path of `dockerfile`.
///
/// Absolute paths are kept. A relative path is joined to `workspace`
/// unless it already starts with it.
pub fn normalize_dockerfile_path(workspace: &Path, dockerfile: &Path) -> std::io::Result<PathBuf> {
    if dockerfile.is_absolute() {
        return Ok(dockerfile.to_path_buf());
    }

    let dockerfile = if dockerfile
        .to_string_lossy()
        .starts_with(workspace.to_string_lossy().as_ref())
    {
        dockerfile.to_path_buf()
    } else {
        workspace.join(dockerfile)
    };
    paths::absolute(&dockerfile)
}

fn process_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => Some(value),
        Err(std::env::VarError::NotPresent) => None,
        Err(std::env::VarError::NotUnicode(raw)) => {
            tracing::warn!(variable = name, value = ?raw, "ignoring non-UTF-8 environment variable");
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("resolving workspace {path}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("normalizing dockerfile path {path}")]
    NormalizeDockerfile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("opening dockerfile {path}")]
    ReadDockerfile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing dockerfile")]
    Parse(#[source] ParseError),
    #[error("putting build arguments")]
    BuildArgs(#[source] ArgError),
    #[error("listing ONBUILD instructions")]
    Onbuild(#[source] ParseError),
    #[error("listing copied files")]
    Copy(#[source] CopyError),
    #[error("expanding copied paths")]
    Expand(#[source] ExpandError),
    #[error("loading ignore patterns")]
    Ignore(#[source] PatternError),
    #[error("walking workspace")]
    Walk(#[source] WalkError),
}
