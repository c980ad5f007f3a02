//! The fetch → build → stage → match → annotate pipeline
//!
//! Each stage blocks on its external tool. The first failing stage ends
//! the run; nothing downstream of it executes and no partial results are
//! kept.

use chrono::Local;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::build::{BuildArtifact, BuildCache, BuildConfig};
use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::manifest::{EngineEntry, RunManifest, MANIFEST_FILE};
use crate::match_runner::{MatchConfig, MatchRunner};
use crate::revision::{RevisionRef, RevisionStore, SourceTree};
use crate::staging::{ArtifactStaging, StagedBinary};

/// Pipeline stage, used to attribute failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Build,
    Stage,
    Match,
    Annotate,
    Record,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Build => "build",
            Stage::Stage => "stage",
            Stage::Match => "match",
            Stage::Annotate => "annotate",
            Stage::Record => "record",
        };
        f.write_str(name)
    }
}

/// A stage failure; downstream stages did not run
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

fn at(stage: Stage) -> impl FnOnce(Error) -> PipelineError {
    move |source| PipelineError { stage, source }
}

/// Everything one SPRT run needs
#[derive(Debug, Clone)]
pub struct SprtRequest {
    pub engine_a: RevisionRef,
    pub engine_b: RevisionRef,
    pub build_config: BuildConfig,
    /// Reuse cached checkouts and build directories
    pub allow_cache: bool,
    pub time_control: String,
    pub games: u32,
    pub concurrency: u32,
    /// Play from the start position only
    pub no_book: bool,
    /// Opening suite to stage; the previously staged suite is used when absent
    pub opening_suite: Option<PathBuf>,
    /// Annotated position file to produce
    pub export: Option<PathBuf>,
}

impl SprtRequest {
    pub fn new(engine_a: RevisionRef, engine_b: RevisionRef) -> Self {
        let defaults = MatchConfig::default();
        Self {
            engine_a,
            engine_b,
            build_config: BuildConfig::default(),
            allow_cache: false,
            time_control: defaults.time_control,
            games: defaults.games,
            concurrency: defaults.concurrency,
            no_book: false,
            opening_suite: None,
            export: None,
        }
    }

    /// Whether both engines resolve to the same build
    pub fn is_same_build(&self) -> bool {
        self.engine_a == self.engine_b
    }
}

/// Runs the whole pipeline against one working root
#[derive(Debug)]
pub struct Pipeline {
    config: HarnessConfig,
    store: RevisionStore,
    builder: BuildCache,
    staging: ArtifactStaging,
    runner: MatchRunner,
}

impl Pipeline {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            store: RevisionStore::new(&config),
            builder: BuildCache::new(&config),
            staging: ArtifactStaging::new(config.bins_dir()),
            runner: MatchRunner::new(&config),
            config,
        }
    }

    pub fn run(&self, request: &SprtRequest) -> std::result::Result<RunManifest, PipelineError> {
        let started = Local::now();
        if request.is_same_build() {
            warn!(
                engine_a = %request.engine_a,
                engine_b = %request.engine_b,
                "engine 1 and engine 2 are the same, no elo differences expected"
            );
        }

        let mut match_config = MatchConfig {
            time_control: request.time_control.clone(),
            games: request.games,
            concurrency: request.concurrency,
            opening_book: None,
            export: request.export.as_deref().map(result_annotator::unfixed_path),
        };
        match_config.validate().map_err(at(Stage::Match))?;

        let tree_a = self.store.fetch(&request.engine_a, request.allow_cache).map_err(at(Stage::Fetch))?;
        let tree_b = if request.is_same_build() {
            tree_a.clone()
        } else {
            self.store.fetch(&request.engine_b, request.allow_cache).map_err(at(Stage::Fetch))?
        };
        debug!(path = %tree_a.root.display(), "engine 1 directory");
        debug!(path = %tree_b.root.display(), "engine 2 directory");

        let artifact_a = self.build(&tree_a, request).map_err(at(Stage::Build))?;
        let artifact_b = if request.is_same_build() {
            artifact_a.clone()
        } else {
            self.build(&tree_b, request).map_err(at(Stage::Build))?
        };

        let staged_a = self.stage(&artifact_a, &request.engine_a).map_err(at(Stage::Stage))?;
        let staged_b = self.stage(&artifact_b, &request.engine_b).map_err(at(Stage::Stage))?;
        if !request.no_book {
            match_config.opening_book = self
                .stage_opening_suite(request.opening_suite.as_deref())
                .map_err(at(Stage::Stage))?;
        }

        if let Some(unfixed) = &match_config.export {
            remove_stale(unfixed).map_err(at(Stage::Match))?;
        }
        self.runner
            .run(&staged_a, &staged_b, &match_config)
            .map_err(at(Stage::Match))?;

        let positions = match &match_config.export {
            Some(unfixed) => finish_export(unfixed).map_err(at(Stage::Annotate))?,
            None => None,
        };

        let manifest = RunManifest {
            started,
            finished: Local::now(),
            build_config: request.build_config,
            engine_a: entry(&request.engine_a, &tree_a, &artifact_a, &staged_a),
            engine_b: entry(&request.engine_b, &tree_b, &artifact_b, &staged_b),
            match_config,
            positions,
        };
        let manifest_path = self.staging.run_dir().join(MANIFEST_FILE);
        manifest.save(&manifest_path).map_err(at(Stage::Record))?;
        info!(path = %manifest_path.display(), "run recorded");

        Ok(manifest)
    }

    fn build(&self, tree: &SourceTree, request: &SprtRequest) -> Result<BuildArtifact> {
        self.builder.build(tree, request.build_config, request.allow_cache)
    }

    fn stage(&self, artifact: &BuildArtifact, revision: &RevisionRef) -> Result<StagedBinary> {
        self.staging.stage_binary(artifact, revision, &self.config.engine_tag)
    }

    /// Stage the opening suite, or fall back to one staged by an earlier run
    fn stage_opening_suite(&self, suite: Option<&Path>) -> Result<Option<PathBuf>> {
        let dest = self.config.opening_suite_path();
        match suite {
            Some(src) => self.staging.stage_opening_suite(src, &dest).map(Some),
            None if dest.is_file() => {
                debug!(path = %dest.display(), "using previously staged opening suite");
                Ok(Some(dest))
            }
            None => {
                warn!("no opening suite available, playing without a book");
                Ok(None)
            }
        }
    }
}

fn entry(
    revision: &RevisionRef,
    tree: &SourceTree,
    artifact: &BuildArtifact,
    staged: &StagedBinary,
) -> EngineEntry {
    EngineEntry {
        revision: revision.clone(),
        source: tree.root.clone(),
        artifact: artifact.path.clone(),
        staged: staged.path.clone(),
    }
}

// The manager may append to an existing export, so a leftover one is dropped.
fn remove_stale(unfixed: &Path) -> Result<()> {
    if unfixed.exists() {
        debug!(path = %unfixed.display(), "removing stale position export");
        fs::remove_file(unfixed).map_err(Error::io(unfixed))?;
    }
    Ok(())
}

/// Annotate the raw export and delete it, leaving only the fixed file
fn finish_export(unfixed: &Path) -> Result<Option<PathBuf>> {
    if !unfixed.is_file() {
        warn!(path = %unfixed.display(), "match produced no position export");
        return Ok(None);
    }
    let fixed = result_annotator::annotate(unfixed)?;
    fs::remove_file(unfixed).map_err(Error::io(unfixed))?;
    info!(path = %fixed.display(), "positions annotated");
    Ok(Some(fixed))
}
