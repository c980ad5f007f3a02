//! Harness configuration
//!
//! Working space layout, clone URL, CMake generator and tool names. Each
//! component receives the config at construction, so independent working
//! roots can coexist in one process.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default upstream repository
pub const DEFAULT_CLONE_URL: &str = "https://github.com/Bobingstern/TinyChess";

/// Configuration shared by every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Root of the working space (sources, bins, staged opening suite)
    pub working_root: PathBuf,
    /// Repository cloned for every revision
    pub clone_url: String,
    /// Directory name `git clone` creates inside each revision directory
    pub repo_dir_name: String,
    /// Entry-point source file, relative to the checkout
    pub entry_source: PathBuf,
    /// UCI identity string patched with the revision
    pub uci_marker: String,
    /// Version-control executable
    pub git: String,
    /// Build-system executable
    pub cmake: String,
    /// CMake generator passed with `-G`
    pub generator: String,
    /// Binary names probed in the build directory, in order
    pub binary_candidates: Vec<String>,
    /// Tournament manager executable
    pub match_manager: String,
    /// Prefix of staged engine binaries
    pub engine_tag: String,
    /// Scheduling margin granted to engines, in milliseconds
    pub time_margin_ms: u32,
    /// File name of the staged opening suite in the working root
    pub opening_suite_name: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            working_root: PathBuf::from("working"),
            clone_url: DEFAULT_CLONE_URL.to_string(),
            repo_dir_name: "TinyChess".to_string(),
            entry_source: PathBuf::from("src").join("main.cpp"),
            uci_marker: "id name TinyChess".to_string(),
            git: "git".to_string(),
            cmake: "cmake".to_string(),
            generator: "Ninja".to_string(),
            binary_candidates: vec!["main.exe".to_string(), "main".to_string()],
            match_manager: "cutechess-cli".to_string(),
            engine_tag: "tinychess".to_string(),
            time_margin_ms: 300,
            opening_suite_name: "Silver_opening_suite.pgn".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Default configuration rooted at `working_root`
    pub fn with_root(working_root: impl Into<PathBuf>) -> Self {
        Self {
            working_root: working_root.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file; missing keys take defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::io(path))?;
        Self::from_toml(&contents).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Per-revision source checkouts
    pub fn sources_dir(&self) -> PathBuf {
        self.working_root.join("sources")
    }

    /// Shared run directory for staged binaries
    pub fn bins_dir(&self) -> PathBuf {
        self.working_root.join("bins")
    }

    /// Location of the staged opening suite
    pub fn opening_suite_path(&self) -> PathBuf {
        self.working_root.join(&self.opening_suite_name)
    }
}
