//! Shared fixtures: a local upstream repository and stand-in tools
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const ENTRY_SOURCE: &str = r#"#include <iostream>
int main() {
    std::cout << "id name TinyChess" << std::endl;
    return 0;
}
"#;

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=test-user", "-c", "user.email=test@example.com"])
        .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Upstream repository with tags `v1` and `v2`, returned with both SHAs
pub fn make_upstream(dir: &Path) -> (PathBuf, String, String) {
    let upstream = dir.join("upstream");
    fs::create_dir_all(upstream.join("src")).unwrap();
    git(&upstream, &["init", "-q"]);

    fs::write(upstream.join("CMakeLists.txt"), "project(TinyChess)\n").unwrap();
    fs::write(upstream.join("src").join("main.cpp"), ENTRY_SOURCE).unwrap();
    git(&upstream, &["add", "."]);
    git(&upstream, &["commit", "-q", "-m", "initial"]);
    git(&upstream, &["tag", "v1"]);
    let v1 = git(&upstream, &["rev-parse", "HEAD"]);

    fs::write(upstream.join("README"), "faster search\n").unwrap();
    git(&upstream, &["add", "."]);
    git(&upstream, &["commit", "-q", "-m", "second"]);
    git(&upstream, &["tag", "v2"]);
    let v2 = git(&upstream, &["rev-parse", "HEAD"]);

    (upstream, v1, v2)
}

/// Write an executable shell script
#[cfg(unix)]
pub fn script(path: &Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

/// cmake stand-in: the build step produces `main`
#[cfg(unix)]
pub fn fake_cmake(dir: &Path) -> String {
    script(
        &dir.join("fake-cmake"),
        "if [ \"$1\" = \"--build\" ]; then printf 'engine' > main; fi\n",
    )
}

/// cutechess-cli stand-in: records its arguments and the staged files, and
/// writes two end positions to the `-epdout` file
#[cfg(unix)]
pub fn fake_cutechess(dir: &Path) -> String {
    script(
        &dir.join("fake-cutechess"),
        r#"echo "$@" > cutechess.args
ls > cutechess.files
while [ $# -gt 0 ]; do
  if [ "$1" = "-epdout" ]; then
    shift
    printf '%s\n' "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3" "8/8/8/4k3/8/4K3/8/8 w - - 0 1" > "$1"
  fi
  shift
done
"#,
    )
}
