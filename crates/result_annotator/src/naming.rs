//! Naming of raw ("unfixed") and annotated ("fixed") export files
//!
//! `games.fens` is exported raw as `games.unfixed.fens`; annotation writes
//! back to `games.fens`. The two names never collide.

use std::path::{Path, PathBuf};

use crate::{AnnotateError, Result};

/// Qualifier marking a raw export
pub const UNFIXED_QUALIFIER: &str = "unfixed";

/// Raw export path for a requested annotated path
pub fn unfixed_path(fixed: &Path) -> PathBuf {
    let stem = fixed
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match fixed.extension() {
        Some(ext) => format!("{stem}.{UNFIXED_QUALIFIER}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{UNFIXED_QUALIFIER}"),
    };
    fixed.with_file_name(name)
}

/// Annotated path for a raw export, dropping the `.unfixed` qualifier
pub fn fixed_path(unfixed: &Path) -> Result<PathBuf> {
    let name = unfixed
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| AnnotateError::NotUnfixed(unfixed.to_path_buf()))?;

    let parts: Vec<&str> = name.split('.').collect();
    // The qualifier is never the leading component, so `.unfixed` alone is rejected
    let Some(idx) = parts
        .iter()
        .skip(1)
        .rposition(|part| *part == UNFIXED_QUALIFIER)
        .map(|i| i + 1)
    else {
        return Err(AnnotateError::NotUnfixed(unfixed.to_path_buf()));
    };

    let fixed: Vec<&str> = parts
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, part)| *part)
        .collect();
    Ok(unfixed.with_file_name(fixed.join(".")))
}
