//! Revision-addressed source checkouts
//!
//! Each revision gets its own clone under `sources/<revision>/<repo>`. A
//! cached clone is either fast-forwarded in place or wiped and re-cloned.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::process::ExternalCommand;

/// A commit hash, branch or tag
///
/// Equality ignores case and surrounding whitespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionRef {
    raw: String,
}

impl RevisionRef {
    pub fn new(revision: &str) -> Result<Self> {
        let raw = revision.trim();
        if raw.is_empty() {
            return Err(Error::EmptyRevision);
        }
        Ok(Self {
            raw: raw.to_string(),
        })
    }

    /// Text handed to `git checkout`
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Normalized identity of the revision
    pub fn key(&self) -> String {
        self.raw.to_lowercase()
    }

    /// `key()` made safe for a single path component.
    ///
    /// Reserved characters are percent-escaped, `%` included, so distinct
    /// keys never share a file name.
    pub fn file_key(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for c in self.key().chars() {
            match c {
                '%' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => {
                    out.push_str(&format!("%{:02X}", c as u32));
                }
                c => out.push(c),
            }
        }
        out
    }
}

impl PartialEq for RevisionRef {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for RevisionRef {}

impl Hash for RevisionRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for RevisionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for RevisionRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<RevisionRef> for String {
    fn from(value: RevisionRef) -> Self {
        value.raw
    }
}

/// One checked-out copy of the engine source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    pub revision: RevisionRef,
    /// Root of the checkout (contains `CMakeLists.txt`)
    pub root: PathBuf,
}

/// Append `-<revision>` to every quoted occurrence of the UCI identity.
///
/// Returns `None` when the quoted marker does not appear in `source`.
pub fn patch_uci_identity(source: &str, marker: &str, revision: &RevisionRef) -> Option<String> {
    let quoted = format!("\"{marker}\"");
    if !source.contains(&quoted) {
        return None;
    }
    Some(source.replace(&quoted, &format!("\"{marker}-{revision}\"")))
}

/// Make every file below `dir` writable so the tree can be removed.
///
/// Git marks its object files read-only, which blocks deletion on some
/// platforms.
pub fn clear_write_protection(dir: &Path) -> Result<()> {
    debug!(dir = %dir.display(), "clearing write protection");
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            Error::Io {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        let mut perms = metadata.permissions();
        if perms.readonly() {
            make_writable(&mut perms);
            fs::set_permissions(path, perms).map_err(Error::io(path))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn make_writable(perms: &mut fs::Permissions) {
    use std::os::unix::fs::PermissionsExt;
    perms.set_mode(perms.mode() | 0o200);
}

#[cfg(not(unix))]
fn make_writable(perms: &mut fs::Permissions) {
    #[allow(clippy::permissions_set_readonly_false)]
    perms.set_readonly(false);
}

/// Cache of source checkouts keyed by revision
#[derive(Debug, Clone)]
pub struct RevisionStore {
    config: HarnessConfig,
}

impl RevisionStore {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Directory owning the checkout of `revision`
    pub fn revision_dir(&self, revision: &RevisionRef) -> PathBuf {
        self.config.sources_dir().join(revision.file_key())
    }

    /// Checkout root of `revision`
    pub fn tree_dir(&self, revision: &RevisionRef) -> PathBuf {
        self.revision_dir(revision).join(&self.config.repo_dir_name)
    }

    /// Produce a checkout of `revision`.
    ///
    /// With `allow_cache` an existing checkout is updated with `git pull`
    /// and reused. Otherwise any existing checkout is removed and the
    /// repository is cloned afresh.
    pub fn fetch(&self, revision: &RevisionRef, allow_cache: bool) -> Result<SourceTree> {
        info!(%revision, "fetching engine source");
        let sources = self.config.sources_dir();
        fs::create_dir_all(&sources).map_err(Error::io(&sources))?;

        let revision_dir = self.revision_dir(revision);
        let tree = self.tree_dir(revision);
        debug!(dir = %revision_dir.display(), "engine source directory");

        if revision_dir.exists() {
            if allow_cache && tree.is_dir() {
                debug!("found cached source, pulling to update it");
                let pull = ExternalCommand::new(&self.config.git)
                    .arg("pull")
                    .current_dir(&tree)
                    .run();
                // A detached checkout (commit hash, tag) has nothing to pull
                if let Err(Error::ProcessFailed { status, .. }) = &pull {
                    warn!(%revision, %status, "could not update cached source, using it as is");
                } else {
                    pull?;
                }
                return Ok(SourceTree {
                    revision: revision.clone(),
                    root: tree,
                });
            }
            if allow_cache {
                info!(%revision, "cached source is incomplete, fetching again");
            }
            self.evict(&revision_dir, &tree)?;
        }

        debug!(dir = %revision_dir.display(), "creating revision directory");
        fs::create_dir_all(&revision_dir).map_err(Error::io(&revision_dir))?;

        ExternalCommand::new(&self.config.git)
            .args(["clone", self.config.clone_url.as_str(), self.config.repo_dir_name.as_str()])
            .current_dir(&revision_dir)
            .run()?;
        ExternalCommand::new(&self.config.git)
            .args(["checkout", revision.as_str()])
            .current_dir(&tree)
            .run()?;

        self.patch_identity(&tree, revision)?;

        Ok(SourceTree {
            revision: revision.clone(),
            root: tree,
        })
    }

    fn evict(&self, revision_dir: &Path, tree: &Path) -> Result<()> {
        let dot_git = tree.join(".git");
        if dot_git.exists() {
            clear_write_protection(&dot_git)?;
        }
        debug!(dir = %revision_dir.display(), "removing cached source");
        fs::remove_dir_all(revision_dir).map_err(Error::io(revision_dir))
    }

    /// Rename the engine's UCI identity so both builds report distinct names
    fn patch_identity(&self, tree: &Path, revision: &RevisionRef) -> Result<()> {
        let entry = tree.join(&self.config.entry_source);
        debug!(path = %entry.display(), "entry source");

        let source = match fs::read_to_string(&entry) {
            Ok(source) => source,
            Err(err) => {
                warn!(path = %entry.display(), %err, "could not read entry source, UCI name unchanged");
                return Ok(());
            }
        };

        match patch_uci_identity(&source, &self.config.uci_marker, revision) {
            Some(patched) => {
                debug!(%revision, "modifying chess engine UCI name");
                fs::write(&entry, patched).map_err(Error::io(&entry))
            }
            None => {
                warn!(marker = %self.config.uci_marker, "could not change chess engine UCI name");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "revision_tests.rs"]
mod revision_tests;
