// src/commands/restart.rs

use std::future::Future;

use crate::cli::RestartArgs;
use crate::commands::start::launch;
use crate::commands::{log_stop_report, shutdown_signal, Services};
use crate::errors::Result;
use crate::process::{resolve_executable, ProcessBackend};

/// `reloadctl restart`: stop the recorded server, then start a new one in
/// the foreground.
pub async fn run<B: ProcessBackend>(services: Services<B>, args: &RestartArgs) -> Result<()> {
    run_until(services, args, shutdown_signal()).await
}

pub async fn run_until<B, S>(mut services: Services<B>, args: &RestartArgs, shutdown: S) -> Result<()>
where
    B: ProcessBackend,
    S: Future<Output = ()>,
{
    let executable = resolve_executable(None, &services.config.server.program)?;

    let report = services.stop_recorded().await?;
    log_stop_report(&report);

    if args.clear {
        services.cache.clear()?;
    }

    let spec = services.config.launch_spec(executable, &services.root, false);
    launch(services, spec, shutdown).await
}
