//! Lexical path helpers.
//!
//! Dependency paths are workspace-relative strings with `/` separators.
//! Nothing here touches the filesystem except [`absolute`], which only
//! reads the current directory.

use std::path::{Component, Path, PathBuf};

/// Lexically clean a path: drop `.` segments and fold `..` into its parent.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Clean a relative `/`-separated path string, e.g. `./files/` → `files`.
pub fn clean_str(path: &str) -> String {
    to_slash(&clean(Path::new(path)))
}

/// Join `rel` under `base` even when `rel` starts with `/`, then clean.
pub fn join_lexical(base: &Path, rel: &str) -> PathBuf {
    clean(&base.join(rel.trim_start_matches('/')))
}

/// Absolute, lexically clean form of `path` (relative paths resolve
/// against the current directory). Symlinks are not followed.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(path).map(|p| clean(&p))
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_owned()),
            Component::CurDir => Some(".".to_owned()),
            Component::RootDir | Component::Prefix(_) => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
