// src/process/launch.rs

//! Description of how to launch the supervised server.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{Result, SupervisorError};

/// Everything needed to spawn one instance of the server launcher.
///
/// The final argument vector is `args` followed by `daemonize_flag` when
/// `daemonize` is set; detaching itself is left to the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub daemonize: bool,
    pub daemonize_flag: String,
    pub working_dir: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(executable: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            args,
            daemonize: false,
            daemonize_flag: "-d".to_string(),
            working_dir: None,
        }
    }

    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.args.clone();
        if self.daemonize {
            argv.push(self.daemonize_flag.clone());
        }
        argv
    }

    /// Human-readable command line, used in logs and errors.
    pub fn display(&self) -> String {
        let mut s = self.executable.display().to_string();
        for arg in self.argv() {
            s.push(' ');
            s.push_str(&arg);
        }
        s
    }
}

/// Resolve the launcher executable.
///
/// An explicit path wins when it exists; otherwise `program` is looked up on
/// `PATH`. Failure to find either is a configuration error.
pub fn resolve_executable(explicit: Option<&Path>, program: &str) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        warn!(path = ?path, "explicit executable not found; searching PATH for '{program}'");
    }

    // A program given as a path (e.g. "./bin/server") is taken as-is.
    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        if as_path.exists() {
            return Ok(as_path.to_path_buf());
        }
        return Err(SupervisorError::Configuration(format!(
            "executable not found: {}",
            as_path.display()
        )));
    }

    let resolved = which::which(program).map_err(|e| {
        SupervisorError::Configuration(format!("executable '{program}' not found on PATH: {e}"))
    })?;
    debug!(program, resolved = ?resolved, "resolved executable on PATH");
    Ok(resolved)
}
