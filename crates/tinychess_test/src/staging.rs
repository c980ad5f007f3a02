//! Staging of engine binaries and the opening suite into the run directory

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::build::BuildArtifact;
use crate::error::{Error, Result};
use crate::revision::RevisionRef;

/// An engine binary copied into the shared run directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBinary {
    pub path: PathBuf,
}

impl StagedBinary {
    /// Directory holding the binary
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// File name the match manager uses to launch the engine
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Destination name of a staged binary: `<tag>-<revision>[.<ext>]`
pub fn staged_name(tag: &str, revision: &RevisionRef, artifact: &Path) -> String {
    match artifact.extension() {
        Some(ext) => format!("{tag}-{}.{}", revision.file_key(), ext.to_string_lossy()),
        None => format!("{tag}-{}", revision.file_key()),
    }
}

/// Copies artifacts into one run directory, replacing stale copies
#[derive(Debug, Clone)]
pub struct ArtifactStaging {
    run_dir: PathBuf,
}

impl ArtifactStaging {
    pub fn new(run_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_dir: run_dir.into(),
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Copy `artifact` into the run directory under a revision-qualified
    /// name. The cached artifact itself is left untouched.
    pub fn stage_binary(
        &self,
        artifact: &BuildArtifact,
        revision: &RevisionRef,
        tag: &str,
    ) -> Result<StagedBinary> {
        let dest = self.run_dir.join(staged_name(tag, revision, &artifact.path));
        self.replace_with_copy(&artifact.path, &dest)?;
        Ok(StagedBinary { path: dest })
    }

    /// Copy the opening suite to `dest`, overwriting any previous copy
    pub fn stage_opening_suite(&self, suite: &Path, dest: &Path) -> Result<PathBuf> {
        self.replace_with_copy(suite, dest)?;
        Ok(dest.to_path_buf())
    }

    fn replace_with_copy(&self, src: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(Error::io(parent))?;
        }
        if dest.exists() {
            if is_same_file(src, dest) {
                debug!(path = %dest.display(), "file is already staged");
                return Ok(());
            }
            debug!(path = %dest.display(), "removing previously staged file");
            fs::remove_file(dest).map_err(Error::io(dest))?;
        }
        debug!(from = %src.display(), to = %dest.display(), "staging file");
        fs::copy(src, dest).map_err(Error::io(src))?;
        Ok(())
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
