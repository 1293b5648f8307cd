// tests/event_backend.rs

mod common;
use crate::common::{init_tracing, TestResult};

use std::fs;
use std::sync::Arc;

use tempfile::tempdir;

use reloadctl::errors::{Result, SupervisorError};
use reloadctl::fs::{FileSystem, RealFileSystem};
use reloadctl::types::BackendPreference;
use reloadctl::watch::{
    ChangeDetector, DefaultDetectorFactory, DetectorFactory, DetectorKind, EventBackend,
    WatchTarget,
};

#[tokio::test]
async fn write_in_watched_dir_is_reported() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("app/Controller"))?;
    fs::write(dir.path().join("app/Controller/Index.php"), "<?php")?;

    let target = WatchTarget::new(vec![dir.path().join("app")], Vec::new(), ["php"], 1);
    let mut detector = EventBackend::new(target, &RealFileSystem)?;

    assert_eq!(detector.kind(), DetectorKind::Event);
    assert!(detector.waits_internally());
    assert_eq!(detector.watched_paths().len(), 2);

    // Nothing happened yet.
    assert!(!detector.has_changes().await?);

    fs::write(dir.path().join("app/Controller/Index.php"), "<?php // edited")?;
    assert!(detector.has_changes().await?);

    // Events were drained by the previous call.
    assert!(!detector.has_changes().await?);
    Ok(())
}

#[tokio::test]
async fn explicit_file_is_watched() -> TestResult {
    let dir = tempdir()?;
    let env = dir.path().join(".env");
    fs::write(&env, "APP_ENV=dev")?;

    let target = WatchTarget::new(Vec::new(), vec![env.clone()], ["php"], 1);
    let mut detector = EventBackend::new(target, &RealFileSystem)?;
    assert_eq!(detector.watched_paths(), [env.clone()]);

    fs::write(&env, "APP_ENV=prod")?;
    assert!(detector.has_changes().await?);
    Ok(())
}

#[tokio::test]
async fn factory_honours_polling_preference() -> TestResult {
    let dir = tempdir()?;
    let target = WatchTarget::new(vec![dir.path().to_path_buf()], Vec::new(), ["php"], 1);

    let mut polling = DefaultDetectorFactory::new(BackendPreference::Polling, Arc::new(RealFileSystem));
    assert_eq!(polling.create(&target)?.kind(), DetectorKind::Polling);

    // inotify is available wherever these tests run on Linux.
    #[cfg(target_os = "linux")]
    {
        let mut auto = DefaultDetectorFactory::new(BackendPreference::Auto, Arc::new(RealFileSystem));
        assert_eq!(auto.create(&target)?.kind(), DetectorKind::Event);
    }
    Ok(())
}

fn no_inotify(_: &WatchTarget, _: &dyn FileSystem) -> Result<Box<dyn ChangeDetector>> {
    Err(SupervisorError::WatchBackendInit("inotify limit reached".into()))
}

fn broken_fs(_: &WatchTarget, _: &dyn FileSystem) -> Result<Box<dyn ChangeDetector>> {
    Err(SupervisorError::Io(std::io::Error::other("disk gone")))
}

#[test]
fn failed_notification_init_falls_back_to_polling() -> TestResult {
    let dir = tempdir()?;
    fs::write(dir.path().join("index.php"), "<?php")?;
    let target = WatchTarget::new(vec![dir.path().to_path_buf()], Vec::new(), ["php"], 1);

    for preference in [BackendPreference::Auto, BackendPreference::Event] {
        let mut factory =
            DefaultDetectorFactory::with_event_init(preference, Arc::new(RealFileSystem), no_inotify);
        let detector = factory.create(&target)?;
        assert_eq!(detector.kind(), DetectorKind::Polling, "preference {preference:?}");
        assert!(!detector.waits_internally());
    }
    Ok(())
}

#[test]
fn other_notification_errors_are_not_swallowed() -> TestResult {
    let dir = tempdir()?;
    let target = WatchTarget::new(vec![dir.path().to_path_buf()], Vec::new(), ["php"], 1);

    let mut factory =
        DefaultDetectorFactory::with_event_init(BackendPreference::Auto, Arc::new(RealFileSystem), broken_fs);
    let err = factory.create(&target).unwrap_err();
    assert!(matches!(err, SupervisorError::Io(_)), "got {err:?}");

    // Polling preference never builds the notification backend.
    let mut polling =
        DefaultDetectorFactory::with_event_init(BackendPreference::Polling, Arc::new(RealFileSystem), broken_fs);
    assert_eq!(polling.create(&target)?.kind(), DetectorKind::Polling);
    Ok(())
}
