//! Result annotation for exported match positions
//!
//! `cutechess-cli -epdout` writes one FEN per finished game into an
//! "unfixed" file. This crate rewrites that file into its "fixed" sibling,
//! appending the result each position implies:
//!
//! - `[1.0]` white won (black to move and checkmated)
//! - `[0.0]` black won (white to move and checkmated)
//! - `[0.5]` anything else
//!
//! # Usage
//!
//! ```no_run
//! use result_annotator::annotate;
//! use std::path::Path;
//!
//! let fixed = annotate(Path::new("games.unfixed.fens")).unwrap();
//! assert_eq!(fixed, Path::new("games.fens"));
//! ```

mod annotate;
mod naming;
mod outcome;

pub use annotate::*;
pub use naming::*;
pub use outcome::*;

use std::path::PathBuf;

/// Errors raised while annotating an export file
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not an unfixed export (expected a `.unfixed` qualifier)", .0.display())]
    NotUnfixed(PathBuf),
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
