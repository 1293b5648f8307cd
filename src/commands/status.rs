// src/commands/status.rs

use std::fs;
use std::os::unix::fs::MetadataExt;

use nix::unistd::{Uid, User};

use crate::commands::Services;
use crate::process::ProcessBackend;

/// Details shown for a live server. Both fields are best effort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessInfo {
    pub user: Option<String>,
    pub command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    NotRunning,
    /// The record exists but its process is gone. The record is left alone.
    Stale { pid: u32 },
    Running { pid: u32, info: ProcessInfo },
}

/// Inspect the pid record without changing anything.
pub fn inspect<B: ProcessBackend>(services: &mut Services<B>) -> StatusReport {
    let Some(pid) = services.registry.read() else {
        return StatusReport::NotRunning;
    };
    if !services.controller.is_running(pid) {
        return StatusReport::Stale { pid };
    }
    StatusReport::Running {
        pid,
        info: process_info(pid),
    }
}

/// `reloadctl status`: print the report to stdout. Always succeeds.
pub fn run<B: ProcessBackend>(services: &mut Services<B>) -> StatusReport {
    let report = inspect(services);
    for line in render(&report) {
        println!("{line}");
    }
    report
}

pub fn render(report: &StatusReport) -> Vec<String> {
    match report {
        StatusReport::NotRunning => vec!["Server is not running.".to_string()],
        StatusReport::Stale { pid } => vec![format!(
            "Pid file exists (PID {pid}) but the process is not running."
        )],
        StatusReport::Running { pid, info } => vec![
            format!("Server is running with PID: {pid}"),
            format!("User: {}", info.user.as_deref().unwrap_or("unknown")),
            format!("Command: {}", info.command.as_deref().unwrap_or("unknown")),
        ],
    }
}

/// Owner and command line from `/proc/<pid>`.
pub fn process_info(pid: u32) -> ProcessInfo {
    let proc_dir = format!("/proc/{pid}");

    let user = fs::metadata(&proc_dir)
        .ok()
        .and_then(|meta| User::from_uid(Uid::from_raw(meta.uid())).ok().flatten())
        .map(|user| user.name);

    let command = fs::read(format!("{proc_dir}/cmdline"))
        .ok()
        .map(|raw| {
            raw.split(|b| *b == 0)
                .filter(|part| !part.is_empty())
                .map(|part| String::from_utf8_lossy(part).into_owned())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|cmd| !cmd.is_empty());

    ProcessInfo { user, command }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_running_falls_back_to_unknown() {
        let lines = render(&StatusReport::Running {
            pid: 42,
            info: ProcessInfo::default(),
        });
        assert_eq!(
            lines,
            vec![
                "Server is running with PID: 42",
                "User: unknown",
                "Command: unknown"
            ]
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_info_reads_own_process() {
        let info = process_info(std::process::id());
        assert!(info.command.is_some());
    }
}
