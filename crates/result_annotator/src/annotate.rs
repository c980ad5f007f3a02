//! Line-by-line annotation of export files

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::naming::fixed_path;
use crate::outcome::classify;
use crate::{AnnotateError, Result};

/// Append the classified result tag to one recorded position
pub fn annotate_line(line: &str) -> String {
    format!("{} {}", line, classify(line).tag())
}

/// Annotate every line from `reader` into `writer`, preserving order.
///
/// Returns the number of lines written.
pub fn annotate_lines<R: BufRead, W: Write>(reader: R, mut writer: W) -> std::io::Result<usize> {
    let mut count = 0;
    for line in reader.lines() {
        writeln!(writer, "{}", annotate_line(&line?))?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Annotate an unfixed export file into its fixed sibling.
///
/// The unfixed input is left in place; removing it once the fixed file
/// exists is up to the caller.
pub fn annotate(unfixed: &Path) -> Result<PathBuf> {
    let fixed = fixed_path(unfixed)?;
    tracing::info!(from = %unfixed.display(), to = %fixed.display(), "annotating positions");

    let input = File::open(unfixed).map_err(io_err(unfixed))?;
    let output = File::create(&fixed).map_err(io_err(&fixed))?;
    let count = annotate_lines(BufReader::new(input), BufWriter::new(output))
        .map_err(io_err(&fixed))?;

    tracing::debug!(lines = count, "annotation complete");
    Ok(fixed)
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> AnnotateError {
    let path = path.to_path_buf();
    move |source| AnnotateError::Io { path, source }
}
