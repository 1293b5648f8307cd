// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::pid::DEFAULT_PID_FILE;
use crate::process::LaunchSpec;
use crate::types::BackendPreference;
use crate::watch::{
    normalize_interval, WatchTarget, DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS,
};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [server]
/// program = "php"
/// args = ["bin/hyperf.php", "start"]
/// daemonize_flag = "-d"
/// stop_timeout = 15
///
/// [runtime]
/// pid_file = "runtime/hyperf.pid"
/// cache_dir = "runtime/container"
///
/// [watch]
/// dirs = ["app", "config"]
/// files = [".env"]
/// extensions = ["env", "php"]
/// interval = 3
/// backend = "auto"
/// ```
///
/// All sections are optional and have reasonable defaults. Relative paths
/// are resolved against the project root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub runtime: RuntimeSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// `[server]` section: how to launch and stop the supervised process.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Executable name looked up on `PATH`, or a path to it.
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments identifying the "start" action of the server launcher.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Appended to `args` when daemon mode is requested.
    #[serde(default = "default_daemonize_flag")]
    pub daemonize_flag: String,

    /// Seconds to wait after the graceful signal before killing.
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout: u64,
}

fn default_program() -> String {
    "php".to_string()
}

fn default_args() -> Vec<String> {
    vec!["bin/hyperf.php".to_string(), "start".to_string()]
}

fn default_daemonize_flag() -> String {
    "-d".to_string()
}

fn default_stop_timeout() -> u64 {
    15
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            daemonize_flag: default_daemonize_flag(),
            stop_timeout: default_stop_timeout(),
        }
    }
}

/// `[runtime]` section: where the supervisor keeps its state.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeSection {
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,

    /// Directory removed by `--clear`.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_pid_file() -> PathBuf {
    PathBuf::from(DEFAULT_PID_FILE)
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("runtime/container")
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            pid_file: default_pid_file(),
            cache_dir: default_cache_dir(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    #[serde(default = "default_dirs")]
    pub dirs: Vec<PathBuf>,

    #[serde(default = "default_files")]
    pub files: Vec<PathBuf>,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Seconds; clamped to 1-15 when the watch target is built.
    #[serde(default = "default_interval")]
    pub interval: i64,

    #[serde(default)]
    pub backend: BackendPreference,
}

fn default_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("app"), PathBuf::from("config")]
}

fn default_files() -> Vec<PathBuf> {
    vec![PathBuf::from(".env")]
}

fn default_extensions() -> Vec<String> {
    vec!["env".to_string(), "php".to_string()]
}

fn default_interval() -> i64 {
    DEFAULT_INTERVAL_SECS as i64
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            dirs: default_dirs(),
            files: default_files(),
            extensions: default_extensions(),
            interval: default_interval(),
            backend: BackendPreference::default(),
        }
    }
}

fn rooted(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

impl ConfigFile {
    pub fn pid_file(&self, root: &Path) -> PathBuf {
        rooted(root, &self.runtime.pid_file)
    }

    pub fn cache_dir(&self, root: &Path) -> PathBuf {
        rooted(root, &self.runtime.cache_dir)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.server.stop_timeout)
    }

    /// Build the watch target, letting a CLI interval override the config.
    /// An out-of-range override is clamped with a warning; the config value
    /// was already reported during validation.
    pub fn watch_target(&self, root: &Path, interval_override: Option<i64>) -> WatchTarget {
        if let Some(requested) = interval_override {
            let effective = normalize_interval(requested);
            if effective as i64 != requested {
                warn!(
                    requested,
                    effective,
                    "--interval outside {MIN_INTERVAL_SECS}-{MAX_INTERVAL_SECS}s; clamping"
                );
            }
        }

        WatchTarget::new(
            self.watch.dirs.iter().map(|d| rooted(root, d)).collect(),
            self.watch.files.iter().map(|f| rooted(root, f)).collect(),
            &self.watch.extensions,
            interval_override.unwrap_or(self.watch.interval),
        )
    }

    /// Launch description for an already resolved executable. The server
    /// runs with the project root as its working directory.
    pub fn launch_spec(&self, executable: PathBuf, root: &Path, daemonize: bool) -> LaunchSpec {
        LaunchSpec {
            executable,
            args: self.server.args.clone(),
            daemonize,
            daemonize_flag: self.server.daemonize_flag.clone(),
            working_dir: Some(root.to_path_buf()),
        }
    }
}
