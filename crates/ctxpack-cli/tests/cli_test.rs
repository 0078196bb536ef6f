use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn ctxpack() -> assert_cmd::Command {
    cargo_bin_cmd!("ctxpack")
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Workspace whose Dockerfile builds from scratch, so no image lookups happen.
fn scratch_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "Dockerfile",
        "FROM scratch\nARG APP=app\nCOPY ${APP}/ /srv/\nCOPY README.md /\n",
    );
    write(tmp.path(), ".dockerignore", "**/*.tmp\n");
    write(tmp.path(), "app/main.rs", "fn main() {}");
    write(tmp.path(), "app/cache.tmp", "");
    write(tmp.path(), "alt/lib.rs", "");
    write(tmp.path(), "README.md", "# readme");
    write(tmp.path(), "unrelated.txt", "");
    tmp
}

// ── Help / Version ──

#[test]
fn shows_help() {
    ctxpack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build contexts"));
}

#[test]
fn shows_version() {
    ctxpack()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ctxpack"));
}

// ── deps ──

#[test]
fn deps_lists_sorted_paths() {
    let tmp = scratch_workspace();

    ctxpack()
        .args(["deps", "--workspace"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("Dockerfile\nREADME.md\napp/main.rs\n");
}

#[test]
fn deps_json_prints_an_array() {
    let tmp = scratch_workspace();

    let output = ctxpack()
        .args(["deps", "--json", "--workspace"])
        .arg(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let deps: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(deps, vec!["Dockerfile", "README.md", "app/main.rs"]);
}

#[test]
fn build_arg_flag_overrides_default() {
    let tmp = scratch_workspace();

    ctxpack()
        .current_dir(tmp.path())
        .args(["deps", "--build-arg", "APP=alt"])
        .assert()
        .success()
        .stdout("Dockerfile\nREADME.md\nalt/lib.rs\n");
}

#[test]
fn config_file_supplies_build_args_and_dockerfile() {
    let tmp = scratch_workspace();
    std::fs::rename(tmp.path().join("Dockerfile"), tmp.path().join("app.Dockerfile")).unwrap();
    write(
        tmp.path(),
        "ctxpack.toml",
        "[build]\ndockerfile = \"app.Dockerfile\"\n\n[build.args]\nAPP = \"alt\"\n",
    );

    ctxpack()
        .current_dir(tmp.path())
        .arg("deps")
        .assert()
        .success()
        .stdout("README.md\nalt/lib.rs\napp.Dockerfile\n");
}

#[test]
fn invalid_build_arg_is_rejected() {
    let tmp = scratch_workspace();

    ctxpack()
        .current_dir(tmp.path())
        .args(["deps", "--build-arg", "=oops"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("oops"));
}

#[test]
fn missing_dockerfile_fails() {
    let tmp = TempDir::new().unwrap();

    ctxpack()
        .current_dir(tmp.path())
        .arg("deps")
        .assert()
        .failure()
        .stderr(predicate::str::contains("opening dockerfile"));
}

#[test]
fn unmatched_copy_source_fails() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "Dockerfile", "FROM scratch\nCOPY nothing-here /\n");

    ctxpack()
        .current_dir(tmp.path())
        .arg("deps")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must match at least one file"));
}

// ── context ──

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = tar::Archive::new(bytes);
    archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn context_writes_tar_file() {
    let tmp = scratch_workspace();
    let out = TempDir::new().unwrap();
    let archive = out.path().join("context.tar");

    ctxpack()
        .args(["context", "--workspace"])
        .arg(tmp.path())
        .arg("--output")
        .arg(&archive)
        .assert()
        .success();

    let bytes = std::fs::read(&archive).unwrap();
    assert_eq!(entry_names(&bytes), vec!["Dockerfile", "README.md", "app/main.rs"]);
}

#[test]
fn context_streams_to_stdout() {
    let tmp = scratch_workspace();

    let output = ctxpack()
        .current_dir(tmp.path())
        .args(["context", "-o", "-"])
        .output()
        .unwrap();
    assert!(output.status.success());

    assert_eq!(
        entry_names(&output.stdout),
        vec!["Dockerfile", "README.md", "app/main.rs"]
    );
}
