//! Record of a completed pipeline run

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::build::BuildConfig;
use crate::error::{Error, Result};
use crate::match_runner::MatchConfig;
use crate::revision::RevisionRef;

/// File name of the manifest inside the run directory
pub const MANIFEST_FILE: &str = "last_run.json";

/// One side of the match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEntry {
    pub revision: RevisionRef,
    pub source: PathBuf,
    pub artifact: PathBuf,
    pub staged: PathBuf,
}

/// What was built and played in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
    pub build_config: BuildConfig,
    pub engine_a: EngineEntry,
    pub engine_b: EngineEntry,
    pub match_config: MatchConfig,
    /// Annotated position file, when positions were exported
    pub positions: Option<PathBuf>,
}

impl RunManifest {
    /// Whether both sides were built from the same revision
    pub fn same_build(&self) -> bool {
        self.engine_a.revision == self.engine_b.revision
    }

    /// Save manifest to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(Error::io(path))
    }

    /// Load manifest from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::io(path))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Human-readable summary
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str("=== TinyChess SPRT run ===\n\n");
        report.push_str(&format!(
            "Engine A: {:<24} {}\n",
            self.engine_a.revision,
            self.engine_a.staged.display()
        ));
        report.push_str(&format!(
            "Engine B: {:<24} {}\n",
            self.engine_b.revision,
            self.engine_b.staged.display()
        ));
        report.push_str(&format!(
            "Build: {}, tc {}, {} games, concurrency {}, book {}\n",
            self.build_config,
            self.match_config.time_control,
            self.match_config.games,
            self.match_config.concurrency,
            if self.match_config.opening_book.is_some() { "on" } else { "off" }
        ));
        if let Some(positions) = &self.positions {
            report.push_str(&format!("Positions: {}\n", positions.display()));
        }
        report.push_str(&format!(
            "Duration: {}s\n",
            (self.finished - self.started).num_seconds()
        ));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rev: &str) -> EngineEntry {
        EngineEntry {
            revision: RevisionRef::new(rev).unwrap(),
            source: PathBuf::from(format!("/ws/sources/{rev}/TinyChess")),
            artifact: PathBuf::from(format!("/ws/sources/{rev}/TinyChess/build/main")),
            staged: PathBuf::from(format!("/ws/bins/tinychess-{rev}")),
        }
    }

    fn manifest(a: &str, b: &str) -> RunManifest {
        let now = Local::now();
        RunManifest {
            started: now,
            finished: now,
            build_config: BuildConfig::Release,
            engine_a: entry(a),
            engine_b: entry(b),
            match_config: MatchConfig::default(),
            positions: Some(PathBuf::from("/out/games.fens")),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let original = manifest("v1", "v2");

        original.save(&path).unwrap();
        let loaded = RunManifest::load(&path).unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_same_build_detection() {
        assert!(!manifest("v1", "v2").same_build());
        assert!(manifest("main", "MAIN").same_build());
    }

    #[test]
    fn test_report_mentions_both_engines() {
        let report = manifest("v1", "v2").generate_report();
        assert!(report.contains("tinychess-v1"));
        assert!(report.contains("tinychess-v2"));
        assert!(report.contains("Release"));
        assert!(report.contains("/out/games.fens"));
    }
}
