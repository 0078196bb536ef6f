//! Runs in its own process: the test changes the working directory.

use std::path::Path;

use ctxpack_build::DependencyResolver;
use ctxpack_core::{BuildArgs, ImageConfigFetcher, ImageFetchError, InsecureRegistries};
use tempfile::TempDir;

struct NoTriggers;

impl ImageConfigFetcher for NoTriggers {
    async fn onbuild_triggers(
        &self,
        _image: &str,
        _insecure_registries: &InsecureRegistries,
    ) -> Result<Vec<String>, ImageFetchError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn dockerfile_spelled_with_relative_workspace_prefix_is_not_joined_twice() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("sub")).unwrap();
    std::fs::write(tmp.path().join("sub/Dockerfile"), "FROM alpine\nCOPY app.txt /\n").unwrap();
    std::fs::write(tmp.path().join("sub/app.txt"), "x").unwrap();
    std::env::set_current_dir(tmp.path()).unwrap();

    let deps = DependencyResolver::new(NoTriggers)
        .dependencies(
            Path::new("sub"),
            Path::new("sub/Dockerfile"),
            &BuildArgs::new(),
            &InsecureRegistries::new(),
        )
        .await
        .unwrap();

    assert_eq!(deps, vec!["Dockerfile", "app.txt"]);
}
