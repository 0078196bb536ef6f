//! Docker build-context archives for a resolved Dockerfile.

use std::io::Write;
use std::path::{Path, PathBuf};

use ctxpack_core::{BuildArgs, ImageConfigFetcher, InsecureRegistries};

use crate::archive::{self, ArchiveError};
use crate::paths;
use crate::resolve::{DependencyResolver, ResolveError};
use crate::stream::{self, PipeReader};

impl<F: ImageConfigFetcher> DependencyResolver<F> {
    /// Write the build context of `dockerfile` as a tar to `writer`.
    ///
    /// Entries are the resolved dependencies, named relative to `workspace`.
    pub async fn write_context<W: Write>(
        &self,
        writer: W,
        workspace: &Path,
        dockerfile: &Path,
        build_args: &BuildArgs,
        insecure_registries: &InsecureRegistries,
    ) -> Result<W, ContextError> {
        let (root, paths) = self
            .context_paths(workspace, dockerfile, build_args, insecure_registries)
            .await?;
        Ok(archive::create_tar(writer, &root, &paths)?)
    }

    /// Like [`write_context`](Self::write_context), but the archive is
    /// produced on a background thread and read through a bounded pipe.
    ///
    /// Resolution errors are returned here; archive errors surface as read
    /// errors on the returned reader.
    pub async fn stream_context(
        &self,
        workspace: &Path,
        dockerfile: &Path,
        build_args: &BuildArgs,
        insecure_registries: &InsecureRegistries,
        capacity: usize,
    ) -> Result<PipeReader, ContextError> {
        let (root, paths) = self
            .context_paths(workspace, dockerfile, build_args, insecure_registries)
            .await?;
        Ok(stream::stream_tar(root, paths, capacity))
    }

    async fn context_paths(
        &self,
        workspace: &Path,
        dockerfile: &Path,
        build_args: &BuildArgs,
        insecure_registries: &InsecureRegistries,
    ) -> Result<(PathBuf, Vec<PathBuf>), ContextError> {
        let deps = self
            .dependencies(workspace, dockerfile, build_args, insecure_registries)
            .await?;

        let root = paths::clean(workspace);
        let paths = deps
            .iter()
            .map(|dep| root.join(dep))
            .collect::<Vec<_>>();

        tracing::debug!(
            workspace = %root.display(),
            entries = paths.len(),
            "creating build context"
        );
        Ok((root, paths))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("getting dockerfile dependencies")]
    Resolve(#[from] ResolveError),
    #[error("creating build context archive")]
    Archive(#[from] ArchiveError),
}
