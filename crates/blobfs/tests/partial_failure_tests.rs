//! Partial-failure tests using fail-rs for fault injection
//!
//! Composite operations are not atomic. These tests check what a failure
//! part way through leaves behind, and that retrying converges.
//!
//! Fail points are global state; each test holds a `FailScenario` so they
//! run one at a time:
//!
//! ```sh
//! cargo test --features failpoints --test partial_failure_tests
//! ```

#![cfg(feature = "failpoints")]

use std::sync::Arc;

use blobfs::{Error, InMemoryStore, ObjectMetadata, Storage};
use fail::FailScenario;

const MAIN: Option<&str> = Some("main");

fn storage() -> (Storage, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    (Storage::with_client(store.clone()), store)
}

async fn put(storage: &Storage, uri: &str) {
    storage
        .put(MAIN, uri, uri.as_bytes(), &ObjectMetadata::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_upload_keeps_created_ancestors() {
    let scenario = FailScenario::setup();
    let (storage, _) = storage();

    // Four marker writes succeed, the object upload fails.
    fail::cfg("memory::write", "4*off->return").unwrap();
    let err = storage
        .put(MAIN, "/ns/x/file.txt", b"data", &ObjectMetadata::new())
        .await
        .unwrap_err();
    fail::cfg("memory::write", "off").unwrap();

    assert!(matches!(err, Error::StorageIo { ref uri, .. } if uri == "blobfs:///ns/x/file.txt"));
    assert!(storage.exists(MAIN, "/ns/x/").await.unwrap());
    assert!(!storage.exists(MAIN, "/ns/x/file.txt").await.unwrap());

    put(&storage, "/ns/x/file.txt").await;
    assert_eq!(
        storage.get(MAIN, "/ns/x/file.txt").await.unwrap(),
        b"/ns/x/file.txt"
    );
    scenario.teardown();
}

#[tokio::test]
async fn failed_copy_leaves_source_intact() {
    let scenario = FailScenario::setup();
    let (storage, store) = storage();
    put(&storage, "/src/a.txt").await;
    put(&storage, "/src/b.txt").await;

    fail::cfg("memory::copy", "1*off->return").unwrap();
    let err = storage.rename(MAIN, "/src", "/dst").await.unwrap_err();
    fail::cfg("memory::copy", "off").unwrap();

    assert!(matches!(err, Error::StorageIo { ref uri, .. } if uri == "blobfs:///src"));
    assert!(storage.exists(MAIN, "/src/a.txt").await.unwrap());
    assert!(storage.exists(MAIN, "/src/b.txt").await.unwrap());
    // The first copy landed before the failure.
    assert!(storage.exists(MAIN, "/dst/a.txt").await.unwrap());
    assert!(!storage.exists(MAIN, "/dst/b.txt").await.unwrap());

    storage.rename(MAIN, "/src", "/dst").await.unwrap();
    assert!(!storage.exists(MAIN, "/src/").await.unwrap());
    assert_eq!(
        store
            .keys()
            .into_iter()
            .filter(|k| k.starts_with("/main/dst/"))
            .collect::<Vec<_>>(),
        vec!["/main/dst/.blobfsdir", "/main/dst/a.txt", "/main/dst/b.txt"]
    );
    scenario.teardown();
}

#[tokio::test]
async fn interrupted_prefix_delete_converges_on_retry() {
    let scenario = FailScenario::setup();
    let (storage, store) = storage();
    for uri in ["/d/a", "/d/b", "/d/sub/c"] {
        put(&storage, uri).await;
    }

    fail::cfg("memory::delete", "2*off->return").unwrap();
    let err = storage.delete_by_prefix(MAIN, "/d/").await.unwrap_err();
    fail::cfg("memory::delete", "off").unwrap();

    assert!(!err.is_not_found());
    // Directories are still in place because markers go last.
    assert!(storage.exists(MAIN, "/d/sub/").await.unwrap());

    storage.delete_by_prefix(MAIN, "/d/").await.unwrap();
    assert!(store.keys().iter().all(|k| !k.starts_with("/main/d/")));
    assert!(!storage.exists(MAIN, "/d").await.unwrap());
    scenario.teardown();
}

#[tokio::test]
async fn listing_failure_is_storage_io() {
    let scenario = FailScenario::setup();
    let (storage, _) = storage();
    put(&storage, "/ns/a.txt").await;

    fail::cfg("memory::list", "return").unwrap();
    let list_err = storage.list(MAIN, "/ns/").await.unwrap_err();
    let prefix_err = storage.all_by_prefix(MAIN, "/ns/", false).await.unwrap_err();
    fail::cfg("memory::list", "off").unwrap();

    for err in [list_err, prefix_err] {
        match err {
            Error::StorageIo { uri, source } => {
                assert_eq!(uri, "blobfs:///ns/");
                assert!(source.to_string().contains("memory::list"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    scenario.teardown();
}
