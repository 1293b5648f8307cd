// tests/pid_registry.rs

mod common;
use crate::common::TestResult;

use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;
use tempfile::tempdir;

use reloadctl::fs::mock::MockFileSystem;
use reloadctl::fs::{FileSystem, RealFileSystem};
use reloadctl::pid::PidRegistry;

proptest! {
    #[test]
    fn write_then_read_round_trips(pid in 1u32..=u32::MAX) {
        let dir = tempdir().unwrap();
        let registry = PidRegistry::new(dir.path().join("runtime/server.pid"), Arc::new(RealFileSystem));

        registry.write(pid).unwrap();
        prop_assert_eq!(registry.read(), Some(pid));

        registry.clear().unwrap();
        prop_assert_eq!(registry.read(), None);
    }
}

#[test]
fn write_creates_runtime_dir_and_stores_bare_decimal() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("runtime").join("server.pid");
    let registry = PidRegistry::new(&path, Arc::new(RealFileSystem));

    registry.write(4242)?;

    assert_eq!(std::fs::read_to_string(&path)?, "4242");
    Ok(())
}

#[test]
fn missing_record_reads_as_absent() {
    let registry = PidRegistry::new("/runtime/server.pid", Arc::new(MockFileSystem::new()));
    assert_eq!(registry.read(), None);
}

#[test]
fn malformed_or_non_positive_records_read_as_absent() {
    let fs = MockFileSystem::new();
    let registry = PidRegistry::new("runtime/server.pid", Arc::new(fs.clone()));

    for content in ["", "abc", "0", "-12", "12abc", "99999999999"] {
        fs.add_file("runtime/server.pid", content);
        assert_eq!(registry.read(), None, "content {content:?}");
    }

    fs.add_file("runtime/server.pid", " 321\n");
    assert_eq!(registry.read(), Some(321));
}

#[test]
fn clear_is_idempotent() -> TestResult {
    let fs = MockFileSystem::new();
    let registry = PidRegistry::new("runtime/server.pid", Arc::new(fs.clone()));

    registry.write(7)?;
    registry.clear()?;
    registry.clear()?;

    assert!(!fs.exists(Path::new("runtime/server.pid")));
    Ok(())
}
