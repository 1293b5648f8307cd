#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reloadctl::Services;
use reloadctl::config::ConfigFile;
use reloadctl::fs::FileSystem;
use reloadctl::process::ProcessBackend;
use reloadctl::types::BackendPreference;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: ConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigFile::default(),
        }
    }

    pub fn with_program(mut self, program: &str) -> Self {
        self.config.server.program = program.to_string();
        self
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.config.server.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_stop_timeout(mut self, secs: u64) -> Self {
        self.config.server.stop_timeout = secs;
        self
    }

    pub fn with_pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.runtime.pid_file = path.into();
        self
    }

    pub fn with_watch_dirs(mut self, dirs: &[&str]) -> Self {
        self.config.watch.dirs = dirs.iter().map(PathBuf::from).collect();
        self
    }

    pub fn with_watch_files(mut self, files: &[&str]) -> Self {
        self.config.watch.files = files.iter().map(PathBuf::from).collect();
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.config.watch.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_interval(mut self, secs: i64) -> Self {
        self.config.watch.interval = secs;
        self
    }

    pub fn with_backend(mut self, backend: BackendPreference) -> Self {
        self.config.watch.backend = backend;
        self
    }

    pub fn build(self) -> ConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Services rooted at `root` over the given filesystem and backend.
pub fn services<B: ProcessBackend>(
    root: impl AsRef<Path>,
    config: ConfigFile,
    fs: Arc<dyn FileSystem>,
    backend: B,
) -> Services<B> {
    Services::new(root.as_ref().to_path_buf(), config, fs, backend)
}
