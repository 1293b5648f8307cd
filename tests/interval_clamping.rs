// tests/interval_clamping.rs

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;

use reloadctl::config::ConfigFile;
use reloadctl::watch::{normalize_interval, WatchTarget, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};

#[test]
fn documented_examples() {
    assert_eq!(normalize_interval(0), 1);
    assert_eq!(normalize_interval(100), 15);
    assert_eq!(normalize_interval(5), 5);
}

#[test]
fn cli_interval_overrides_config_and_is_clamped() {
    let mut cfg = ConfigFile::default();
    cfg.watch.interval = 4;

    let root = Path::new("/srv/app");
    assert_eq!(cfg.watch_target(root, None).interval(), Duration::from_secs(4));
    assert_eq!(cfg.watch_target(root, Some(9)).interval(), Duration::from_secs(9));
    assert_eq!(cfg.watch_target(root, Some(-3)).interval(), Duration::from_secs(1));
    assert_eq!(cfg.watch_target(root, Some(60)).interval(), Duration::from_secs(15));
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn logs_of(f: impl FnOnce()) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    captured.text()
}

#[test]
fn clamped_cli_interval_is_reported() {
    let cfg = ConfigFile::default();
    let root = Path::new("/srv/app");

    let logs = logs_of(|| {
        cfg.watch_target(root, Some(60));
    });
    assert!(logs.contains("clamping"), "got {logs:?}");

    let logs = logs_of(|| {
        cfg.watch_target(root, Some(7));
        cfg.watch_target(root, None);
    });
    assert!(!logs.contains("clamping"), "got {logs:?}");
}

proptest! {
    #[test]
    fn interval_is_always_within_bounds(requested in any::<i64>()) {
        let effective = normalize_interval(requested);
        prop_assert!((MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&effective));
    }

    #[test]
    fn in_range_intervals_are_kept(requested in 1i64..=15) {
        let target = WatchTarget::new(Vec::new(), Vec::new(), ["php"], requested);
        prop_assert_eq!(target.interval(), Duration::from_secs(requested as u64));
    }
}
