// src/commands/start.rs

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::cli::StartArgs;
use crate::commands::{log_stop_report, shutdown_signal, Services};
use crate::engine::{WatchLoop, WatchLoopParts, WatchTimings};
use crate::errors::{Result, SupervisorError};
use crate::process::{resolve_executable, LaunchSpec, ProcessBackend};
use crate::watch::DefaultDetectorFactory;

const DAEMON_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// `reloadctl start`.
pub async fn run<B: ProcessBackend>(services: Services<B>, args: &StartArgs) -> Result<()> {
    run_until(services, args, shutdown_signal()).await
}

/// Like [`run`], with the shutdown trigger supplied by the caller.
pub async fn run_until<B, S>(mut services: Services<B>, args: &StartArgs, shutdown: S) -> Result<()>
where
    B: ProcessBackend,
    S: Future<Output = ()>,
{
    let executable = resolve_executable(args.executable.as_deref(), &services.config.server.program)?;

    let report = services.stop_recorded().await?;
    log_stop_report(&report);

    if args.watch {
        return run_watch(services, args, executable, shutdown).await;
    }

    if args.clear {
        services.cache.clear()?;
    }

    let spec = services
        .config
        .launch_spec(executable, &services.root, args.daemonize);
    launch(services, spec, shutdown).await
}

/// Start once. Daemon mode returns once the detached server has recorded its
/// pid; otherwise wait for the server to exit or for `shutdown`, which stops it.
pub(crate) async fn launch<B, S>(mut services: Services<B>, spec: LaunchSpec, shutdown: S) -> Result<()>
where
    B: ProcessBackend,
    S: Future<Output = ()>,
{
    let handle = services.controller.start(&spec)?;
    let pid = handle.pid;

    if spec.daemonize {
        return await_daemon(&mut services, pid).await;
    }

    if let Err(err) = services.registry.write(pid) {
        services
            .controller
            .stop(Some(pid), services.config.stop_timeout())
            .await?;
        return Err(err);
    }

    info!(pid, "server running in the foreground; press Ctrl+C to stop");

    tokio::pin!(shutdown);
    let interrupted = tokio::select! {
        _ = services.controller.wait_for_exit(pid) => false,
        _ = &mut shutdown => true,
    };

    if interrupted {
        let timeout = services.stop_timeout();
        services.controller.stop(Some(pid), timeout).await?;
    } else {
        info!(pid, "server exited");
    }

    services.release_record(pid)
}

/// Wait for a daemonizing launcher to hand over to the server it forked.
///
/// The launcher's pid is never recorded while it detaches: the server
/// writes the pid record itself. A launcher still alive after the stop
/// timeout did not detach and is recorded instead.
async fn await_daemon<B: ProcessBackend>(services: &mut Services<B>, launcher: u32) -> Result<()> {
    let deadline = Instant::now() + services.stop_timeout();

    loop {
        let detached = !services.controller.is_running(launcher);
        if detached {
            if let Some(pid) = live_record(services, launcher) {
                info!(pid, pid_file = ?services.registry.path(), "server started in daemon mode");
                return Ok(());
            }
        }

        if Instant::now() >= deadline {
            if detached {
                return Err(SupervisorError::Other(anyhow!(
                    "launcher {launcher} exited without leaving a live pid record in {}",
                    services.registry.path().display()
                )));
            }
            warn!(pid = launcher, "launcher did not detach; recording its pid");
            return services.registry.write(launcher);
        }

        sleep(DAEMON_POLL_INTERVAL).await;
    }
}

fn live_record<B: ProcessBackend>(services: &mut Services<B>, launcher: u32) -> Option<u32> {
    let pid = services.registry.read().filter(|&pid| pid != launcher)?;
    services.controller.is_running(pid).then_some(pid)
}

async fn run_watch<B, S>(
    services: Services<B>,
    args: &StartArgs,
    executable: PathBuf,
    shutdown: S,
) -> Result<()>
where
    B: ProcessBackend,
    S: Future<Output = ()>,
{
    if args.daemonize {
        warn!("daemon mode is ignored with --watch; the server stays attached");
    }

    let launch = services.config.launch_spec(executable, &services.root, false);
    let target = services.config.watch_target(&services.root, args.interval);
    let factory = DefaultDetectorFactory::new(services.config.watch.backend, services.fs.clone());
    let stop_timeout = services.stop_timeout();

    let parts = WatchLoopParts {
        controller: services.controller,
        factory,
        registry: services.registry,
        target,
        launch,
        stop_timeout,
        cache: args.clear.then_some(services.cache),
        timings: WatchTimings::default(),
    };

    WatchLoop::new(parts).run_until(shutdown).await
}
