//! SPRT harness for TinyChess revisions
//!
//! This crate provides infrastructure for:
//! - Fetching engine sources at a revision, with a per-revision cache
//! - Building them with CMake, reusing build directories on request
//! - Staging both binaries side by side and running an SPRT with cutechess-cli
//! - Labelling exported end positions with their results
//!
//! # Usage
//!
//! ```bash
//! # Is main at least 5 Elo stronger than the previous release?
//! cargo run -p tinychess_test --release -- sprt --e1c v1.2 --e2c main \
//!     --build-type release --tc 10+0.1 --concurrency 8 --book suite.pgn
//!
//! # Label a raw export by hand
//! cargo run -p tinychess_test -- annotate games.unfixed.fens
//! ```

mod build;
mod config;
mod error;
mod manifest;
mod match_runner;
mod pipeline;
mod process;
mod revision;
mod staging;
pub mod telemetry;

pub use build::*;
pub use config::*;
pub use error::*;
pub use manifest::*;
pub use match_runner::*;
pub use pipeline::*;
pub use process::*;
pub use revision::*;
pub use staging::*;
