// tests/notify_backend.rs

mod common;
use crate::common::{CallbackRecorder, eventually, init_tracing, with_timeout};

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{
    AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode,
};
use tempfile::TempDir;

use reloadwatch::engine::Watcher;
use reloadwatch::errors::WatchError;
use reloadwatch::watch::backend::{classify_event_kind, classify_path_kind};
use reloadwatch::watch::{EventKind, NotifyBackend, PathKind, RootRebase};

type TestResult = Result<(), Box<dyn Error>>;

/// Native backends can be slow to report on loaded CI machines.
const NATIVE_SETTLE: Duration = Duration::from_secs(5);

fn project() -> Result<(TempDir, PathBuf), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    fs::create_dir_all(root.join("src/nested"))?;
    Ok((dir, root))
}

#[tokio::test]
async fn real_file_change_triggers_a_reload() -> TestResult {
    init_tracing();
    let (_dir, root) = project()?;
    let recorder = CallbackRecorder::new();
    let pattern = format!("{}/src/**/*.php", root.display());

    let mut watcher = Watcher::new(Arc::new(NotifyBackend));
    watcher.start([pattern], recorder.callback())?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    fs::write(root.join("src/nested/Kernel.php"), "<?php\n")?;
    assert!(eventually(NATIVE_SETTLE, || recorder.calls() >= 1).await);

    with_timeout(watcher.drain()).await;
    let after_drain = recorder.calls();

    fs::write(root.join("src/nested/Other.php"), "<?php\n")?;
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(recorder.calls(), after_drain);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn root_behind_a_symlink_still_triggers_reloads() -> TestResult {
    init_tracing();
    let (_dir, real) = project()?;
    let name = real.file_name().unwrap_or_default().to_string_lossy();
    let link = real.with_file_name(format!("{name}-link"));
    std::os::unix::fs::symlink(&real, &link)?;

    let recorder = CallbackRecorder::new();
    let pattern = format!("{}/src/**/*.php", link.display());
    let mut watcher = Watcher::new(Arc::new(NotifyBackend));
    watcher.start([pattern], recorder.callback())?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    fs::write(real.join("src/nested/Kernel.php"), "<?php\n")?;
    let fired = eventually(NATIVE_SETTLE, || recorder.calls() >= 1).await;

    with_timeout(watcher.drain()).await;
    fs::remove_file(&link)?;
    assert!(fired, "symlinked root never triggered a reload");
    Ok(())
}

#[test]
fn resolved_paths_are_rebased_onto_the_compiled_root() {
    let rebase = RootRebase::new(PathBuf::from("/private/tmp/x"), PathBuf::from("/tmp/x"));

    assert_eq!(rebase.watched(), Path::new("/private/tmp/x"));
    assert_eq!(
        rebase.apply(Path::new("/private/tmp/x/src/a.php")),
        Path::new("/tmp/x/src/a.php")
    );
    assert_eq!(
        rebase.apply(Path::new("/private/tmp/x")),
        Path::new("/tmp/x")
    );
    // Component-aware: a sibling sharing the prefix text is left alone.
    assert_eq!(
        rebase.apply(Path::new("/private/tmp/xy/a.php")),
        Path::new("/private/tmp/xy/a.php")
    );
}

#[test]
fn identical_roots_leave_paths_untouched() {
    let rebase = RootRebase::new(PathBuf::from("/srv/app"), PathBuf::from("/srv/app"));
    assert_eq!(
        rebase.apply(Path::new("/srv/app/a.php")),
        Path::new("/srv/app/a.php")
    );
}

#[tokio::test]
async fn non_matching_and_symlink_changes_are_ignored() -> TestResult {
    init_tracing();
    let (_dir, root) = project()?;
    let recorder = CallbackRecorder::new();
    let pattern = format!("{}/src/**/*.php", root.display());

    let mut watcher = Watcher::new(Arc::new(NotifyBackend));
    watcher.start([pattern], recorder.callback())?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    fs::write(root.join("src/notes.txt"), "hello")?;
    #[cfg(unix)]
    std::os::unix::fs::symlink("/nonexistent/target.php", root.join("src/link.php"))?;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(recorder.calls(), 0);

    with_timeout(watcher.drain()).await;
    Ok(())
}

#[tokio::test]
async fn missing_root_fails_to_start() -> TestResult {
    let (_dir, root) = project()?;
    let missing = root.join("does-not-exist");
    let recorder = CallbackRecorder::new();
    let mut watcher = Watcher::new(Arc::new(NotifyBackend));

    let pattern = format!("{}/*.php", missing.display());
    let err = watcher.start([pattern], recorder.callback()).unwrap_err();

    match err {
        WatchError::UnableToStartWatching { root: failed, .. } => assert_eq!(failed, missing),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn notify_event_kinds_map_onto_native_codes() {
    use notify::EventKind as N;

    assert_eq!(
        classify_event_kind(&N::Create(CreateKind::File)),
        EventKind::Create
    );
    assert_eq!(
        classify_event_kind(&N::Remove(RemoveKind::Any)),
        EventKind::Destroy
    );
    assert_eq!(
        classify_event_kind(&N::Modify(ModifyKind::Name(RenameMode::Both))),
        EventKind::Rename
    );
    assert_eq!(
        classify_event_kind(&N::Modify(ModifyKind::Data(DataChange::Content))),
        EventKind::Modify
    );
    assert_eq!(
        classify_event_kind(&N::Modify(ModifyKind::Any)),
        EventKind::Modify
    );
    assert_eq!(
        classify_event_kind(&N::Modify(ModifyKind::Metadata(MetadataKind::Ownership))),
        EventKind::Owner
    );
    assert_eq!(
        classify_event_kind(&N::Access(AccessKind::Any)),
        EventKind::Other
    );
    assert_eq!(classify_event_kind(&N::Any), EventKind::Other);
}

#[test]
fn path_kind_comes_from_the_entry_itself() -> TestResult {
    use notify::EventKind as N;

    let (_dir, root) = project()?;
    let file = root.join("src/a.php");
    fs::write(&file, "")?;
    let any = N::Modify(ModifyKind::Any);

    assert_eq!(classify_path_kind(&any, &file), PathKind::File);
    assert_eq!(classify_path_kind(&any, &root.join("src")), PathKind::Dir);

    #[cfg(unix)]
    {
        let link = root.join("src/link.php");
        std::os::unix::fs::symlink(&file, &link)?;
        // Reported as a file creation, but the entry is a symlink.
        assert_eq!(
            classify_path_kind(&N::Create(CreateKind::File), &link),
            PathKind::SymLink
        );
    }
    Ok(())
}

#[test]
fn vanished_paths_fall_back_to_the_reported_kind() {
    use notify::EventKind as N;

    let gone = PathBuf::from("/definitely/not/here/x");
    assert_eq!(
        classify_path_kind(&N::Remove(RemoveKind::Folder), &gone),
        PathKind::Dir
    );
    assert_eq!(
        classify_path_kind(&N::Remove(RemoveKind::File), &gone),
        PathKind::File
    );
    assert_eq!(
        classify_path_kind(&N::Remove(RemoveKind::Other), &gone),
        PathKind::Other
    );
    assert_eq!(
        classify_path_kind(&N::Modify(ModifyKind::Any), &gone),
        PathKind::File
    );
}
