use std::sync::Arc;

use storage::{DurableStore, FilePreferences, PreferenceMedium, SqlitePreferences, StoreError};

#[tokio::test]
async fn native_store_outage_falls_back_to_local_file_acceptance() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database_url = format!(
        "sqlite://{}",
        dir.path()
            .join("native")
            .join("preferences.db")
            .to_string_lossy()
            .replace('\\', "/")
    );
    let local_path = dir.path().join("local_storage.json");

    let native = Arc::new(SqlitePreferences::new(&database_url).await.expect("native"));
    let local = Arc::new(FilePreferences::new(&local_path));
    let store = DurableStore::builder()
        .medium(native.clone())
        .medium(local.clone())
        .build();

    store.set("theme", "dark").await.expect("native write");
    assert_eq!(
        native.get("theme").await.expect("native read").as_deref(),
        Some("\"dark\"")
    );
    assert!(!local_path.exists(), "healthy native store keeps the file untouched");

    native.close().await;

    store.set("name", "Ava").await.expect("fallback write");
    let name: Option<String> = store.get("name").await.expect("fallback read");
    assert_eq!(name.as_deref(), Some("Ava"));
    assert_eq!(
        local.get("name").await.expect("file read").as_deref(),
        Some("\"Ava\"")
    );

    // The file never saw "theme"; with the native store gone it reads as absent.
    let theme: Option<String> = store.get("theme").await.expect("theme read");
    assert!(theme.is_none());

    store.remove("never-set").await.expect("remove absent");
    store.set("count", &42).await.expect("count write");
    let count: Option<u32> = store.get("count").await.expect("count read");
    assert_eq!(count, Some(42));
}

#[tokio::test]
async fn both_media_down_is_the_only_surfaced_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").expect("blocker");

    let native = SqlitePreferences::new("sqlite::memory:").await.expect("native");
    native.close().await;
    // A regular file in the parent position makes every file write fail.
    let local = FilePreferences::new(blocker.join("local_storage.json"));

    let store = DurableStore::builder().medium(native).medium(local).build();
    let err = store.set("name", "Ava").await.expect_err("no medium left");
    let StoreError::Unavailable { faults, .. } = err else {
        panic!("expected storage fault");
    };
    assert_eq!(faults.len(), 2);
    assert_eq!(faults[0].medium, "sqlite");
    assert_eq!(faults[1].medium, "file");
}
