//! Expansion of COPY/ADD sources into workspace paths.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::paths;

/// Resolve each source group against `workspace`.
///
/// A source naming an existing path is kept verbatim; anything else is a
/// glob whose matches are made workspace-relative. Every group must match
/// at least one path. The result is sorted and deduplicated.
pub fn expand_paths(workspace: &Path, copied: &[Vec<String>]) -> Result<Vec<String>, ExpandError> {
    let workspace = paths::clean(workspace);
    let workspace = workspace.as_path();
    let mut expanded: BTreeSet<String> = BTreeSet::new();

    for files in copied {
        let mut matches_one = false;

        for p in files {
            let path = paths::join_lexical(workspace, p);
            if path.exists() {
                expanded.insert(p.clone());
                matches_one = true;
                continue;
            }

            let pattern = format!(
                "{}/{}",
                glob::Pattern::escape(&workspace.to_string_lossy()),
                p.trim_start_matches('/')
            );
            let entries = glob::glob(&pattern).map_err(|e| ExpandError::InvalidPattern {
                pattern: p.clone(),
                source: e,
            })?;

            for entry in entries {
                let found = entry.map_err(|e| ExpandError::Glob {
                    path: e.path().to_path_buf(),
                    source: e.into_error(),
                })?;
                let rel = found
                    .strip_prefix(workspace)
                    .map_err(|_| ExpandError::OutsideWorkspace { path: found.clone() })?;
                expanded.insert(paths::to_slash(rel));
                matches_one = true;
            }
        }

        if !matches_one {
            return Err(ExpandError::NoMatch {
                patterns: files.clone(),
            });
        }
    }

    tracing::debug!(dependencies = ?expanded, "found dependencies for dockerfile");
    Ok(expanded.into_iter().collect())
}

#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    #[error("invalid glob pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("reading {path} while globbing")]
    Glob {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("getting relative path of {path}")]
    OutsideWorkspace { path: PathBuf },
    #[error("file pattern {patterns:?} must match at least one file")]
    NoMatch { patterns: Vec<String> },
}
