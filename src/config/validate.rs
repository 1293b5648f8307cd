use tracing::warn;

use crate::config::model::ConfigFile;
use crate::errors::{Result, SupervisorError};
use crate::watch::{normalize_interval, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - `[server].program` and `[server].args` are not empty
/// - `[server].daemonize_flag` is not empty
/// - `[server].stop_timeout >= 1`
/// - `[runtime].pid_file` is set
///
/// An out-of-range `[watch].interval` is not an error; it is clamped later
/// and only reported here.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_server(cfg)?;
    validate_runtime(cfg)?;
    validate_watch(cfg);
    Ok(())
}

fn validate_server(cfg: &ConfigFile) -> Result<()> {
    if cfg.server.program.trim().is_empty() {
        return Err(SupervisorError::Configuration(
            "[server].program must name the server launcher".to_string(),
        ));
    }

    if cfg.server.args.is_empty() {
        return Err(SupervisorError::Configuration(
            "[server].args must contain at least the start action".to_string(),
        ));
    }

    if cfg.server.daemonize_flag.trim().is_empty() {
        return Err(SupervisorError::Configuration(
            "[server].daemonize_flag must not be empty".to_string(),
        ));
    }

    if cfg.server.stop_timeout == 0 {
        return Err(SupervisorError::Configuration(
            "[server].stop_timeout must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_runtime(cfg: &ConfigFile) -> Result<()> {
    if cfg.runtime.pid_file.as_os_str().is_empty() {
        return Err(SupervisorError::Configuration(
            "[runtime].pid_file must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &ConfigFile) {
    let requested = cfg.watch.interval;
    let effective = normalize_interval(requested);
    if effective as i64 != requested {
        warn!(
            requested,
            effective,
            "[watch].interval outside {MIN_INTERVAL_SECS}-{MAX_INTERVAL_SECS}s; clamping"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        validate_config(&ConfigFile::default()).unwrap();
    }

    #[test]
    fn empty_args_are_rejected() {
        let mut cfg = ConfigFile::default();
        cfg.server.args.clear();
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, SupervisorError::Configuration(_)));
    }

    #[test]
    fn zero_stop_timeout_is_rejected() {
        let mut cfg = ConfigFile::default();
        cfg.server.stop_timeout = 0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn out_of_range_interval_is_accepted() {
        let mut cfg = ConfigFile::default();
        cfg.watch.interval = 100;
        validate_config(&cfg).unwrap();
    }
}
