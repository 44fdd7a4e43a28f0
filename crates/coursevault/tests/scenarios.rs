//! End-to-end scenarios for the content vault.
//!
//! Each test builds a vault in its own temporary directory and drives it the
//! way the portal's upload, viewer, and admin pages do.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::thread;

use coursevault::{
    ContentId, ContentKind, ContentVault, MemoryIndex, MemoryScreenshotLog, ScreenshotPolicy,
    UserId, VaultConfig, VaultError,
};

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn open(root: &Path) -> ContentVault {
    init_tracing();
    ContentVault::open(VaultConfig::with_root(root), MemoryIndex::new()).unwrap()
}

fn temp_entries(vault: &ContentVault) -> usize {
    std::fs::read_dir(&vault.config().temp_dir).unwrap().count()
}

#[test]
fn hello_world_roundtrip_through_vault() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open(dir.path());

    let record = vault
        .add_content("Greeting", ContentKind::Pdf, "hello.pdf", b"hello world")
        .unwrap();

    let on_disk = std::fs::read(&record.artifact_path).unwrap();
    assert!(on_disk.len() > 11);
    assert!(!on_disk.windows(11).any(|w| w == b"hello world"));

    assert_eq!(vault.content_data(record.id).unwrap().bytes, b"hello world");
}

#[test]
fn key_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let record = {
        let vault = open(dir.path());
        vault
            .add_content("Week 1", ContentKind::Pdf, "week1.pdf", b"%PDF week one")
            .unwrap()
    };

    // A fresh process: same key file, metadata handed back by the database.
    let vault = open(dir.path());
    let bytes = vault.store().read(&record.artifact_path).unwrap();
    assert_eq!(bytes, b"%PDF week one");
}

#[test]
fn lost_key_makes_old_artifacts_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = VaultConfig::with_root(dir.path());

    let artifact = {
        let vault = open(dir.path());
        vault
            .add_content("Week 1", ContentKind::Pdf, "week1.pdf", b"%PDF week one")
            .unwrap()
            .artifact_path
    };

    std::fs::remove_file(&config.key_path).unwrap();
    let vault = open(dir.path());

    let err = vault.store().read(&artifact).unwrap_err();
    assert!(err.is_decryption());
}

#[test]
fn missing_key_directory_prevents_startup() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut config = VaultConfig::with_root(dir.path());
    config.key_path = dir.path().join("no-such-dir").join("secure_key.key");

    let err = match ContentVault::open(config, MemoryIndex::new()) {
        Ok(_) => panic!("vault opened without a key"),
        Err(e) => e,
    };

    assert!(err.is_fatal());
    assert!(matches!(err, VaultError::Core(_)));
}

#[test]
fn corrupted_key_file_prevents_startup() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = VaultConfig::with_root(dir.path());
    std::fs::write(&config.key_path, b"not a key").unwrap();

    let err = match ContentVault::open(config, MemoryIndex::new()) {
        Ok(_) => panic!("vault opened with a corrupt key"),
        Err(e) => e,
    };

    assert!(err.is_fatal());
}

#[test]
fn tampered_artifact_is_unavailable_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open(dir.path());

    let good = vault
        .add_content("Good", ContentKind::Pdf, "good.pdf", b"%PDF good")
        .unwrap();
    let bad = vault
        .add_content("Bad", ContentKind::Video, "bad.mp4", b"ftypmp42 bad")
        .unwrap();

    let mut blob = std::fs::read(&bad.artifact_path).unwrap();
    blob[30] ^= 0x04;
    std::fs::write(&bad.artifact_path, &blob).unwrap();

    match vault.content_data(bad.id) {
        Err(VaultError::ContentUnavailable { id, .. }) => assert_eq!(id, bad.id),
        other => panic!("expected ContentUnavailable, got {:?}", other),
    }
    let viewed = vault.view_content(bad.id, |_, _| ());
    assert!(matches!(viewed, Err(VaultError::ContentUnavailable { .. })));
    assert_eq!(temp_entries(&vault), 0);

    // Other content keeps working.
    assert_eq!(vault.content_data(good.id).unwrap().bytes, b"%PDF good");
}

#[test]
fn view_cleans_up_on_success_error_and_panic() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open(dir.path());
    let record = vault
        .add_content("Lecture", ContentKind::Video, "lecture.webm", b"webm frames")
        .unwrap();

    let (path, mime) = vault
        .view_content(record.id, |path, mime| {
            assert_eq!(std::fs::read(path).unwrap(), b"webm frames");
            (path.to_path_buf(), mime.to_string())
        })
        .unwrap();
    assert_eq!(mime, "video/webm");
    assert!(!path.exists());

    let failed: Result<(), String> = vault
        .view_content(record.id, |_, _| Err("player rejected stream".to_string()))
        .unwrap();
    assert!(failed.is_err());
    assert_eq!(temp_entries(&vault), 0);

    let mut seen = PathBuf::new();
    let crashed = panic::catch_unwind(AssertUnwindSafe(|| {
        vault.view_content(record.id, |path, _| {
            seen = path.to_path_buf();
            panic!("renderer crashed");
        })
    }));
    assert!(crashed.is_err());
    assert!(!seen.as_os_str().is_empty());
    assert!(!seen.exists());
    assert_eq!(temp_entries(&vault), 0);
}

#[test]
fn plaintext_never_lands_in_encrypted_dir() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open(dir.path());
    let record = vault
        .add_content("Notes", ContentKind::Pdf, "notes.pdf", b"%PDF notes")
        .unwrap();

    vault
        .view_content(record.id, |path, _| {
            assert!(!path.starts_with(vault.store().dir()));
            let names: Vec<_> = std::fs::read_dir(vault.store().dir())
                .unwrap()
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .collect();
            assert!(names.iter().all(|n| n.ends_with(".enc")));
        })
        .unwrap();
}

#[test]
fn temp_dir_aliasing_encrypted_dir_is_refused() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut config = VaultConfig::with_root(dir.path());
    config.temp_dir = dir.path().join("uploads/../uploads/encrypted/tmp");

    let err = ContentVault::open(config, MemoryIndex::new()).err().unwrap();
    assert!(matches!(err, VaultError::Config(_)));
    assert!(!dir.path().join("uploads/encrypted/tmp").exists());
}

#[cfg(unix)]
#[test]
fn temp_dir_symlinked_into_encrypted_dir_is_refused() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let encrypted = dir.path().join("uploads").join("encrypted");
    std::fs::create_dir_all(&encrypted).unwrap();
    std::os::unix::fs::symlink(&encrypted, dir.path().join("view")).unwrap();

    let err = ContentVault::open(VaultConfig::with_root(dir.path()), MemoryIndex::new())
        .err()
        .unwrap();
    assert!(matches!(err, VaultError::Config(_)));
}

#[test]
fn delete_removes_artifact_and_record() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open(dir.path());
    let keep = vault
        .add_content("Keep", ContentKind::Pdf, "same.pdf", b"%PDF same")
        .unwrap();
    let doomed = vault
        .add_content("Drop", ContentKind::Pdf, "same.pdf", b"%PDF same")
        .unwrap();
    assert_ne!(keep.artifact_path, doomed.artifact_path);

    let removed = vault.delete_content(doomed.id).unwrap();

    assert_eq!(removed.id, doomed.id);
    assert!(!doomed.artifact_path.exists());
    assert!(matches!(
        vault.get_content(doomed.id),
        Err(VaultError::ContentNotFound(_))
    ));
    assert_eq!(vault.content_data(keep.id).unwrap().bytes, b"%PDF same");
}

#[test]
fn delete_with_missing_artifact_still_removes_record() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open(dir.path());
    let record = vault
        .add_content("Gone", ContentKind::Pdf, "gone.pdf", b"%PDF gone")
        .unwrap();
    std::fs::remove_file(&record.artifact_path).unwrap();

    vault.delete_content(record.id).unwrap();

    assert!(vault.list_content().unwrap().is_empty());
}

#[test]
fn concurrent_viewers_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let vault = Arc::new(open(dir.path()));
    let ids: Vec<ContentId> = (0..4)
        .map(|i| {
            vault
                .add_content(
                    &format!("Item {}", i),
                    ContentKind::Pdf,
                    &format!("item{}.pdf", i),
                    format!("%PDF item {}", i).as_bytes(),
                )
                .unwrap()
                .id
        })
        .collect();

    let handles: Vec<_> = (0..16)
        .map(|n| {
            let vault = vault.clone();
            let id = ids[n % ids.len()];
            thread::spawn(move || {
                vault
                    .view_content(id, |path, _| {
                        let bytes = std::fs::read(path).unwrap();
                        (path.to_path_buf(), bytes)
                    })
                    .unwrap()
            })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        let (path, bytes) = handle.join().unwrap();
        assert_eq!(bytes, format!("%PDF item {}", n % 4).into_bytes());
        assert!(!path.exists());
    }
    assert_eq!(temp_entries(&vault), 0);
}

#[test]
fn screenshot_limit_while_viewing() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open(dir.path());
    let record = vault
        .add_content("Exam", ContentKind::Pdf, "exam.pdf", b"%PDF exam")
        .unwrap();
    let policy = ScreenshotPolicy::from_config(vault.config(), MemoryScreenshotLog::new());
    let student = UserId(12);

    let decisions: Vec<bool> = (0..4)
        .map(|_| policy.attempt(student, record.id).unwrap().is_allowed())
        .collect();

    assert_eq!(decisions, vec![true, true, true, false]);
}
