//! CMake builds of checked-out sources

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::process::ExternalCommand;
use crate::revision::SourceTree;

/// CMake build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildConfig {
    #[default]
    Debug,
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildConfig {
    /// Spelling expected by `CMAKE_BUILD_TYPE`
    pub fn cmake_name(self) -> &'static str {
        match self {
            BuildConfig::Debug => "Debug",
            BuildConfig::Release => "Release",
            BuildConfig::RelWithDebInfo => "RelWithDebInfo",
            BuildConfig::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cmake_name())
    }
}

impl FromStr for BuildConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(BuildConfig::Debug),
            "release" => Ok(BuildConfig::Release),
            "relwithdebinfo" => Ok(BuildConfig::RelWithDebInfo),
            "minsizerel" => Ok(BuildConfig::MinSizeRel),
            _ => Err(Error::InvalidBuildConfig(s.to_string())),
        }
    }
}

/// A compiled engine executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub path: PathBuf,
}

/// First candidate that exists in `build_dir`, in list order
pub fn probe_binary(build_dir: &Path, candidates: &[String]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| build_dir.join(name))
        .find(|path| path.is_file())
}

/// Builds source trees and reuses previous build directories on request
#[derive(Debug, Clone)]
pub struct BuildCache {
    config: HarnessConfig,
}

impl BuildCache {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Build directory of a source tree
    pub fn build_dir(tree: &SourceTree) -> PathBuf {
        tree.root.join("build")
    }

    /// Compile `tree` with `build_config`.
    ///
    /// With `allow_cache` a binary already present in the build directory
    /// is returned as is. Otherwise, or when no binary is found, the build
    /// directory is recreated and CMake runs from scratch.
    pub fn build(
        &self,
        tree: &SourceTree,
        build_config: BuildConfig,
        allow_cache: bool,
    ) -> Result<BuildArtifact> {
        info!(path = %tree.root.display(), %build_config, "compiling CMake project");
        let build_dir = Self::build_dir(tree);

        if build_dir.exists() {
            if allow_cache {
                if let Some(path) = probe_binary(&build_dir, &self.config.binary_candidates) {
                    debug!(path = %path.display(), "found cached binary");
                    return Ok(BuildArtifact { path });
                }
                info!("could not find binary in cache, rebuilding");
            }
            fs::remove_dir_all(&build_dir).map_err(Error::io(&build_dir))?;
        }
        fs::create_dir_all(&build_dir).map_err(Error::io(&build_dir))?;

        debug!(generator = %self.config.generator, "generating build system");
        ExternalCommand::new(&self.config.cmake)
            .args(["..", "-G", self.config.generator.as_str(), "-D"])
            .arg(format!("CMAKE_BUILD_TYPE={build_config}"))
            .current_dir(&build_dir)
            .run()?;

        debug!("compiling binary");
        ExternalCommand::new(&self.config.cmake)
            .args(["--build", "."])
            .current_dir(&build_dir)
            .run()?;

        let path = probe_binary(&build_dir, &self.config.binary_candidates).ok_or_else(|| {
            Error::BinaryNotFound {
                build_dir: build_dir.clone(),
                candidates: self.config.binary_candidates.clone(),
            }
        })?;
        debug!(path = %path.display(), "binary built");
        Ok(BuildArtifact { path })
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod build_tests;
