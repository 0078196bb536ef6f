//! Build-context tar archives.
//!
//! Entries are written in the order paths are given. Headers carry a
//! fixed mtime and owner so identical trees produce identical bytes; the
//! permission bits of each file are kept.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::paths;

/// Write a tar of `paths` to `writer`, naming entries relative to `root`.
///
/// Relative `paths` resolve against the current directory, like `root`.
/// Directories produce a single directory entry (their contents are not
/// recursed into), which keeps empty directories in the archive.
pub fn create_tar<W: Write>(
    writer: W,
    root: &Path,
    paths: &[PathBuf],
) -> Result<W, ArchiveError> {
    let abs_root = paths::absolute(root).map_err(|e| ArchiveError::Resolve {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);

    for path in paths {
        add_to_tar(&mut builder, &abs_root, path)?;
    }

    builder.into_inner().map_err(|e| ArchiveError::Finish { source: e })
}

fn add_to_tar<W: Write>(
    builder: &mut tar::Builder<W>,
    root: &Path,
    src: &Path,
) -> Result<(), ArchiveError> {
    let abs = paths::absolute(src).map_err(|e| ArchiveError::Resolve {
        path: src.to_path_buf(),
        source: e,
    })?;
    let name = abs
        .strip_prefix(root)
        .map(paths::to_slash)
        .map_err(|_| ArchiveError::OutsideRoot {
            path: abs.clone(),
            root: root.to_path_buf(),
        })?;
    if name.is_empty() {
        tracing::debug!(path = %abs.display(), "skipping context root itself");
        return Ok(());
    }

    let metadata = std::fs::symlink_metadata(&abs).map_err(|e| ArchiveError::Stat {
        path: abs.clone(),
        source: e,
    })?;

    let mut header = tar::Header::new_gnu();
    header.set_metadata_in_mode(&metadata, tar::HeaderMode::Deterministic);
    header.set_mode(permissions(&metadata));

    let file_type = metadata.file_type();
    let result = if file_type.is_dir() {
        builder.append_data(&mut header, &name, std::io::empty())
    } else if file_type.is_file() {
        let file = std::fs::File::open(&abs).map_err(|e| ArchiveError::Open {
            path: abs.clone(),
            source: e,
        })?;
        builder.append_data(&mut header, &name, file)
    } else if file_type.is_symlink() {
        let target = std::fs::read_link(&abs).map_err(|e| ArchiveError::Stat {
            path: abs.clone(),
            source: e,
        })?;
        header.set_size(0);
        builder.append_link(&mut header, &name, &target)
    } else {
        tracing::debug!(path = %abs.display(), "skipping special file");
        return Ok(());
    };

    result.map_err(|e| ArchiveError::Append { name, source: e })
}

#[cfg(unix)]
fn permissions(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permissions(metadata: &std::fs::Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("resolving absolute path of {path}")]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not under context root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("stating {path}")]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("opening {path}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("writing tar entry {name}")]
    Append {
        name: String,
        source: std::io::Error,
    },
    #[error("finishing tar archive")]
    Finish { source: std::io::Error },
}
