use super::*;
use crate::revision::RevisionRef;

fn candidates() -> Vec<String> {
    vec!["main.exe".to_string(), "main".to_string()]
}

fn tree_in(dir: &Path) -> SourceTree {
    let root = dir.join("TinyChess");
    fs::create_dir_all(&root).unwrap();
    SourceTree {
        revision: RevisionRef::new("abc123").unwrap(),
        root,
    }
}

#[cfg(unix)]
fn fake_cmake(dir: &Path, produce: Option<&str>) -> String {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-cmake");
    let body = match produce {
        // Generation step records its arguments; build step emits the binary
        Some(name) => format!(
            "#!/bin/sh\nif [ \"$1\" = \"--build\" ]; then touch {name}; else echo \"$@\" > generate.args; fi\n"
        ),
        None => "#!/bin/sh\nexit 0\n".to_string(),
    };
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script.to_string_lossy().into_owned()
}

#[test]
fn test_build_config_parse_and_display() {
    assert_eq!("release".parse::<BuildConfig>().unwrap(), BuildConfig::Release);
    assert_eq!("Debug".parse::<BuildConfig>().unwrap(), BuildConfig::Debug);
    assert_eq!(
        "RELWITHDEBINFO".parse::<BuildConfig>().unwrap(),
        BuildConfig::RelWithDebInfo
    );
    assert!(matches!(
        "fast".parse::<BuildConfig>(),
        Err(Error::InvalidBuildConfig(_))
    ));
    assert_eq!(BuildConfig::MinSizeRel.to_string(), "MinSizeRel");
    assert_eq!(BuildConfig::default(), BuildConfig::Debug);
}

#[test]
fn test_probe_binary_only_matches_candidates() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(probe_binary(dir.path(), &candidates()), None);

    fs::write(dir.path().join("main.o"), "").unwrap();
    assert_eq!(probe_binary(dir.path(), &candidates()), None);

    fs::write(dir.path().join("main"), "").unwrap();
    assert_eq!(
        probe_binary(dir.path(), &candidates()),
        Some(dir.path().join("main"))
    );
}

#[test]
fn test_probe_binary_prefers_earlier_candidate() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main"), "").unwrap();
    fs::write(dir.path().join("main.exe"), "").unwrap();
    assert_eq!(
        probe_binary(dir.path(), &candidates()),
        Some(dir.path().join("main.exe"))
    );
}

#[test]
fn test_probe_binary_ignores_directories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("main")).unwrap();
    assert_eq!(probe_binary(dir.path(), &candidates()), None);
}

#[test]
fn test_cached_binary_is_reused_without_building() {
    let dir = tempfile::tempdir().unwrap();
    let tree = tree_in(dir.path());
    let build_dir = BuildCache::build_dir(&tree);
    fs::create_dir_all(&build_dir).unwrap();
    fs::write(build_dir.join("main"), "cached").unwrap();

    let config = HarnessConfig {
        cmake: "cmake-must-not-run-7d2e".to_string(),
        ..HarnessConfig::with_root(dir.path())
    };
    let artifact = BuildCache::new(&config)
        .build(&tree, BuildConfig::Release, true)
        .unwrap();

    assert_eq!(artifact.path, build_dir.join("main"));
    assert_eq!(fs::read_to_string(artifact.path).unwrap(), "cached");
}

#[cfg(unix)]
#[test]
fn test_no_cache_discards_previous_build() {
    let dir = tempfile::tempdir().unwrap();
    let tree = tree_in(dir.path());
    let build_dir = BuildCache::build_dir(&tree);
    fs::create_dir_all(&build_dir).unwrap();
    fs::write(build_dir.join("stale.o"), "").unwrap();

    let config = HarnessConfig {
        cmake: fake_cmake(dir.path(), Some("main")),
        ..HarnessConfig::with_root(dir.path())
    };
    let artifact = BuildCache::new(&config)
        .build(&tree, BuildConfig::Release, false)
        .unwrap();

    assert_eq!(artifact.path, build_dir.join("main"));
    assert!(!build_dir.join("stale.o").exists());

    let args = fs::read_to_string(build_dir.join("generate.args")).unwrap();
    assert_eq!(args.trim(), ".. -G Ninja -D CMAKE_BUILD_TYPE=Release");
}

#[cfg(unix)]
#[test]
fn test_stale_cache_triggers_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let tree = tree_in(dir.path());
    fs::create_dir_all(BuildCache::build_dir(&tree)).unwrap();

    let config = HarnessConfig {
        cmake: fake_cmake(dir.path(), Some("main.exe")),
        ..HarnessConfig::with_root(dir.path())
    };
    let artifact = BuildCache::new(&config)
        .build(&tree, BuildConfig::Debug, true)
        .unwrap();

    assert_eq!(artifact.path, BuildCache::build_dir(&tree).join("main.exe"));
}

#[cfg(unix)]
#[test]
fn test_missing_binary_after_build_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let tree = tree_in(dir.path());

    let config = HarnessConfig {
        cmake: fake_cmake(dir.path(), None),
        ..HarnessConfig::with_root(dir.path())
    };
    let result = BuildCache::new(&config).build(&tree, BuildConfig::Debug, false);

    match result {
        Err(Error::BinaryNotFound { build_dir, candidates }) => {
            assert_eq!(build_dir, BuildCache::build_dir(&tree));
            assert_eq!(candidates, vec!["main.exe", "main"]);
        }
        other => panic!("expected BinaryNotFound, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_failing_build_tool_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let tree = tree_in(dir.path());

    let config = HarnessConfig {
        cmake: "false".to_string(),
        ..HarnessConfig::with_root(dir.path())
    };
    let result = BuildCache::new(&config).build(&tree, BuildConfig::Debug, false);
    assert!(matches!(result, Err(Error::ProcessFailed { .. })));
}
