use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ignore::PatternSet;
use crate::paths;

/// Expand dependency paths into the files they cover, honoring `excludes`.
///
/// Directories are walked recursively; an excluded directory prunes its
/// whole subtree. Files named directly are checked on their own. Every
/// dependency must exist. Other file types are skipped.
pub fn walk_workspace(
    workspace: &Path,
    excludes: &PatternSet,
    deps: &[String],
) -> Result<BTreeSet<String>, WalkError> {
    let workspace = paths::clean(workspace);
    let workspace = workspace.as_path();
    let mut files = BTreeSet::new();

    for dep in deps {
        let dep = paths::clean_str(dep);
        let abs_dep = paths::join_lexical(workspace, &dep);

        let metadata = std::fs::metadata(&abs_dep).map_err(|e| WalkError::Stat {
            path: abs_dep.clone(),
            source: e,
        })?;

        if metadata.is_dir() {
            let walker = WalkDir::new(&abs_dep)
                .min_depth(1)
                .into_iter()
                .filter_entry(|entry| {
                    if !entry.file_type().is_dir() {
                        return true;
                    }
                    // Prune excluded directories before descending.
                    match relative(workspace, entry.path()) {
                        Ok(rel) => !excludes.matches(&rel),
                        Err(e) => {
                            tracing::warn!(error = %e, "not pruning directory outside workspace");
                            true
                        }
                    }
                });

            for entry in walker {
                let entry = entry.map_err(|e| WalkError::Walk {
                    path: abs_dep.clone(),
                    source: e,
                })?;
                if entry.file_type().is_dir() {
                    continue;
                }

                let rel = relative(workspace, entry.path())?;
                if !excludes.matches(&rel) {
                    files.insert(rel);
                }
            }
        } else if metadata.is_file() {
            if !excludes.matches(&dep) {
                files.insert(dep);
            }
        } else {
            tracing::debug!(path = %abs_dep.display(), "skipping dependency that is neither file nor directory");
        }
    }

    Ok(files)
}

fn relative(workspace: &Path, path: &Path) -> Result<String, WalkError> {
    path.strip_prefix(workspace)
        .map(paths::to_slash)
        .map_err(|_| WalkError::OutsideWorkspace {
            path: path.to_path_buf(),
        })
}

#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("stating file {path}")]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("walking folder {path}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("getting relative path of {path}")]
    OutsideWorkspace { path: PathBuf },
}
