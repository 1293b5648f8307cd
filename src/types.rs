use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Which change-detection backend the watch loop should build.
///
/// - `Auto`: use filesystem notifications when the platform facility can be
///   initialised, otherwise fall back to polling (default).
/// - `Event`: prefer notifications; initialisation failures still fall back
///   to polling, with a warning.
/// - `Polling`: always scan signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    Auto,
    Event,
    Polling,
}

impl Default for BackendPreference {
    fn default() -> Self {
        BackendPreference::Auto
    }
}

impl FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(BackendPreference::Auto),
            "event" => Ok(BackendPreference::Event),
            "polling" => Ok(BackendPreference::Polling),
            other => Err(format!(
                "invalid watch backend: {other} (expected \"auto\", \"event\" or \"polling\")"
            )),
        }
    }
}

/// Lifecycle state of the watch loop. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchState {
    Starting,
    Running,
    Stopping,
    ErrorBackoff,
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchState::Starting => "STARTING",
            WatchState::Running => "RUNNING",
            WatchState::Stopping => "STOPPING",
            WatchState::ErrorBackoff => "ERROR_BACKOFF",
        };
        f.write_str(s)
    }
}
