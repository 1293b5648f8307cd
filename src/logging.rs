// src/logging.rs

//! Logging for `reloadctl`: a `tracing-subscriber` fmt layer on stderr,
//! filtered by an `EnvFilter`.
//!
//! Filter precedence:
//! 1. `--log-level` applies one level to everything.
//! 2. `RELOADCTL_LOG` takes full filter directives, so a single module can
//!    be made louder: `RELOADCTL_LOG=info,reloadctl::watch=debug`.
//! 3. `info`.
//!
//! stdout stays free for `status` output.

use anyhow::{anyhow, Result};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` flag is given.
pub const LOG_ENV_VAR: &str = "RELOADCTL_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let (filter, rejected) = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))?;

    if let Some(reason) = rejected {
        warn!(var = LOG_ENV_VAR, %reason, "ignoring invalid log filter; using {DEFAULT_DIRECTIVE}");
    }
    Ok(())
}

/// The filter to install, plus the parse error when `env` held an invalid
/// filter and the default was used instead.
fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (EnvFilter::new(directive(level)), None);
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        None => (EnvFilter::new(DEFAULT_DIRECTIVE), None),
        Some(directives) => match EnvFilter::try_new(directives) {
            Ok(filter) => (filter, None),
            Err(e) => (
                EnvFilter::new(DEFAULT_DIRECTIVE),
                Some(format!("{directives:?}: {e}")),
            ),
        },
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn cli_level_overrides_environment() {
        let (filter, rejected) = build_filter(Some(LogLevel::Warn), Some("trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
        assert!(rejected.is_none());
    }

    #[test]
    fn environment_accepts_per_module_directives() {
        let (filter, rejected) = build_filter(None, Some("info,reloadctl::watch=debug"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
        assert!(rejected.is_none());
    }

    #[test]
    fn missing_or_blank_environment_defaults_to_info() {
        for env in [None, Some("  ")] {
            let (filter, rejected) = build_filter(None, env);
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
            assert!(rejected.is_none());
        }
    }

    #[test]
    fn invalid_environment_filter_is_reported() {
        let (filter, rejected) = build_filter(None, Some("reloadctl=loudest"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
        assert!(rejected.is_some_and(|r| r.contains("reloadctl=loudest")));
    }
}
