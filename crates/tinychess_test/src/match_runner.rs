//! SPRT matches between two staged engines via cutechess-cli

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::process::ExternalCommand;
use crate::staging::StagedBinary;

/// Hypotheses and error rates of the SPRT
///
/// The match always asks whether engine B is at least 5 Elo stronger than
/// engine A at 5% type I and type II error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SprtBounds {
    pub elo0: f64,
    pub elo1: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl SprtBounds {
    pub const STANDARD: SprtBounds = SprtBounds {
        elo0: 0.0,
        elo1: 5.0,
        alpha: 0.05,
        beta: 0.05,
    };

    fn args(&self) -> Vec<String> {
        vec![
            "-sprt".to_string(),
            format!("elo0={}", self.elo0),
            format!("elo1={}", self.elo1),
            format!("alpha={}", self.alpha),
            format!("beta={}", self.beta),
        ]
    }
}

/// Configuration for a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Time control in cutechess syntax, passed through unchecked
    pub time_control: String,
    /// Maximum number of games
    pub games: u32,
    /// Games played in parallel by the match manager
    pub concurrency: u32,
    /// PGN opening suite (None = no book)
    pub opening_book: Option<PathBuf>,
    /// Raw position export file (the unfixed file, see `result_annotator`)
    pub export: Option<PathBuf>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            time_control: "10+0.1".to_string(),
            games: 1000,
            concurrency: 1,
            opening_book: None,
            export: None,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.games == 0 {
            return Err(Error::InvalidMatchConfig("game count must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidMatchConfig("concurrency must be at least 1".into()));
        }
        if self.time_control.trim().is_empty() {
            return Err(Error::InvalidMatchConfig("time control must not be empty".into()));
        }
        Ok(())
    }
}

/// Command a staged engine is launched with, relative to the run directory
pub fn engine_command(staged: &StagedBinary) -> String {
    if cfg!(windows) {
        staged.file_name()
    } else {
        format!("./{}", staged.file_name())
    }
}

/// Runs SPRT matches with the external tournament manager
#[derive(Debug, Clone)]
pub struct MatchRunner {
    program: String,
    time_margin_ms: u32,
    bounds: SprtBounds,
}

impl MatchRunner {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            program: config.match_manager.clone(),
            time_margin_ms: config.time_margin_ms,
            bounds: SprtBounds::STANDARD,
        }
    }

    /// Build the tournament manager invocation for engine A vs engine B.
    ///
    /// Both binaries must live in the same directory, which becomes the
    /// manager's working directory.
    pub fn command(
        &self,
        engine_a: &StagedBinary,
        engine_b: &StagedBinary,
        config: &MatchConfig,
    ) -> Result<ExternalCommand> {
        config.validate()?;
        if engine_a.dir() != engine_b.dir() {
            return Err(Error::StagingMismatch(
                engine_a.dir().to_path_buf(),
                engine_b.dir().to_path_buf(),
            ));
        }

        let mut cmd = ExternalCommand::new(&self.program)
            .args(["-engine".to_string(), format!("cmd={}", engine_command(engine_a))])
            .args(["-engine".to_string(), format!("cmd={}", engine_command(engine_b))])
            .args([
                "-each".to_string(),
                "proto=uci".to_string(),
                format!("tc={}", config.time_control),
                format!("timemargin={}", self.time_margin_ms),
            ])
            .args(self.bounds.args())
            .args(["-games".to_string(), config.games.to_string()])
            .args(["-concurrency".to_string(), config.concurrency.to_string()])
            .current_dir(engine_a.dir());

        if let Some(book) = &config.opening_book {
            cmd = cmd.args([
                "-openings".to_string(),
                format!("file={}", absolute(book)?.display()),
                "format=pgn".to_string(),
            ]);
        }
        if let Some(export) = &config.export {
            cmd = cmd.args(["-epdout".to_string(), absolute(export)?.display().to_string()]);
        }
        Ok(cmd)
    }

    /// Play the match; blocks until the manager exits.
    ///
    /// Standings are reported by the manager on the console and are not
    /// parsed here.
    pub fn run(
        &self,
        engine_a: &StagedBinary,
        engine_b: &StagedBinary,
        config: &MatchConfig,
    ) -> Result<()> {
        let cmd = self.command(engine_a, engine_b, config)?;
        info!(
            engine_a = %engine_a.file_name(),
            engine_b = %engine_b.file_name(),
            book = config.opening_book.is_some(),
            "starting SPRT"
        );
        cmd.run()
    }
}

// The manager runs in the staging directory, so caller-relative paths are
// resolved before they are handed over.
fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(Error::io(path))
}

#[cfg(test)]
#[path = "match_runner_tests.rs"]
mod match_runner_tests;
