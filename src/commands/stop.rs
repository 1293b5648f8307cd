// src/commands/stop.rs

use tracing::{info, warn};

use crate::commands::{Services, StopReport};
use crate::errors::Result;
use crate::process::ProcessBackend;

/// `reloadctl stop`. A missing or stale record is not an error.
pub async fn run<B: ProcessBackend>(services: &mut Services<B>) -> Result<StopReport> {
    let report = services.stop_recorded().await?;
    match report {
        StopReport::NoRecord => warn!(
            path = ?services.registry.path(),
            "no running server found (no pid record)"
        ),
        StopReport::Stale { pid } => warn!(
            pid,
            "server is not running; removed stale pid record"
        ),
        StopReport::Stopped { pid, outcome } => info!(pid, ?outcome, "server stopped"),
    }
    Ok(report)
}
