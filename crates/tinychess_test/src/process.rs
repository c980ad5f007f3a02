//! Blocking execution of external tools (git, cmake, cutechess-cli)

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// One invocation of an external tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    /// Executable name or path
    pub program: String,
    /// Arguments, passed through verbatim
    pub args: Vec<String>,
    /// Working directory (inherits ours when `None`)
    pub cwd: Option<PathBuf>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run inside `dir`
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Render as a single shell-like line for logs
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion with inherited stdio.
    ///
    /// A nonzero exit is reported as [`Error::ProcessFailed`]; the
    /// tool's own output is the only diagnostic.
    pub fn run(&self) -> Result<()> {
        match &self.cwd {
            Some(cwd) => tracing::debug!(cwd = %cwd.display(), "running `{}`", self.display_line()),
            None => tracing::debug!("running `{}`", self.display_line()),
        }

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let status = command.status().map_err(|source| Error::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !status.success() {
            return Err(Error::ProcessFailed {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod process_tests;
