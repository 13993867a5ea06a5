use chrono::Utc;
use facegate::{
    error::{AppError, ErrorKind},
    models::dataset::{AttachedFile, Dataset},
    testing::{user, MemoryObjectStore, TestApp},
};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

fn files(names: &[&str]) -> Vec<AttachedFile> {
    names
        .iter()
        .map(|name| AttachedFile::new(*name, PNG.to_vec()))
        .collect()
}

fn app_with_alice(objects: MemoryObjectStore) -> TestApp {
    let app = TestApp::with_objects(objects);
    app.store.seed_user(user("alice", "inst-1", "admin"));
    app
}

#[tokio::test]
async fn first_upload_records_dataset_and_stores_files() {
    let app = app_with_alice(MemoryObjectStore::new());

    app.state
        .datasets
        .upload_dataset(
            "alice",
            vec![
                AttachedFile::new("front.png", PNG.to_vec()),
                AttachedFile::new("notes.bin", b"not an image".to_vec()),
            ],
        )
        .await
        .unwrap();

    let rows = app.store.datasets();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].username, "alice");
    assert_eq!(rows[0].bucket_path, "inst-1/alice");

    assert_eq!(
        app.objects.keys(),
        vec!["inst-1/alice/front.png", "inst-1/alice/notes.bin"]
    );
    let front = app.objects.object("inst-1/alice/front.png").unwrap();
    assert_eq!(front.content_type.as_deref(), Some("image/png"));
    assert_eq!(app.objects.object("inst-1/alice/notes.bin").unwrap().content_type, None);

    assert_eq!(app.store.commits(), 1);
    assert_eq!(app.store.open_transactions(), 0);
}

#[tokio::test]
async fn repeat_upload_adds_files_without_a_second_record() {
    let app = app_with_alice(MemoryObjectStore::new());

    app.state.datasets.upload_dataset("alice", files(&["1.png", "2.png"])).await.unwrap();
    app.state.datasets.upload_dataset("alice", files(&["3.png"])).await.unwrap();

    assert_eq!(app.store.datasets().len(), 1);
    assert_eq!(app.objects.put_calls(), 3);
    assert_eq!(app.objects.keys().len(), 3);
}

#[tokio::test]
async fn failed_put_rolls_back_record_but_keeps_earlier_objects() {
    let app = app_with_alice(MemoryObjectStore::new());
    app.objects.fail_put_on_call(2);

    let err = app
        .state
        .datasets
        .upload_dataset("alice", files(&["1.png", "2.png", "3.png"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert!(app.store.datasets().is_empty());
    assert_eq!(app.objects.keys(), vec!["inst-1/alice/1.png"]);
    assert_eq!(app.objects.put_calls(), 2);
    assert_eq!(app.store.rollbacks(), 1);
    assert_eq!(app.store.open_transactions(), 0);
}

#[tokio::test]
async fn upload_for_unknown_user_is_not_found() {
    let app = TestApp::new();

    let err = app
        .state
        .datasets
        .upload_dataset("ghost", files(&["1.png"]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(app.objects.put_calls(), 0);
    assert_eq!(app.store.transactions_begun(), 0);
}

#[tokio::test]
async fn upload_rejects_empty_batches_and_path_like_names() {
    let app = app_with_alice(MemoryObjectStore::new());

    let empty = app.state.datasets.upload_dataset("alice", Vec::new()).await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

    let traversal = app
        .state
        .datasets
        .upload_dataset("alice", files(&["../bob/face.png"]))
        .await;
    assert!(matches!(traversal, Err(AppError::Validation(_))));

    assert_eq!(app.objects.put_calls(), 0);
}

#[tokio::test]
async fn concurrent_uploads_for_one_user_create_one_record() {
    let app = app_with_alice(MemoryObjectStore::new());
    let datasets = app.state.datasets.clone();
    let other = app.state.datasets.clone();

    let (first, second) = tokio::join!(
        datasets.upload_dataset("alice", files(&["a.png"])),
        other.upload_dataset("alice", files(&["b.png"])),
    );

    first.unwrap();
    second.unwrap();
    assert_eq!(app.store.datasets().len(), 1);
    assert_eq!(app.objects.keys().len(), 2);
}

#[tokio::test]
async fn delete_removes_record_and_every_page_of_objects() {
    let app = app_with_alice(MemoryObjectStore::with_page_size(2));
    app.store.seed_user(user("alice2", "inst-1", "admin"));

    app.state
        .datasets
        .upload_dataset("alice", files(&["1.png", "2.png", "3.png", "4.png", "5.png"]))
        .await
        .unwrap();
    app.state.datasets.upload_dataset("alice2", files(&["1.png"])).await.unwrap();

    app.state.datasets.delete_dataset("alice").await.unwrap();

    let remaining: Vec<String> = app.store.datasets().into_iter().map(|d| d.username).collect();
    assert_eq!(remaining, vec!["alice2"]);
    assert_eq!(app.objects.keys(), vec!["inst-1/alice2/1.png"]);
    assert_eq!(app.store.open_transactions(), 0);
}

#[tokio::test]
async fn delete_with_no_objects_is_not_found_and_keeps_record() {
    let app = app_with_alice(MemoryObjectStore::new());
    app.store.seed_dataset(Dataset {
        username: "alice".to_string(),
        bucket_path: "inst-1/alice".to_string(),
        created_at: Utc::now(),
    });

    let err = app.state.datasets.delete_dataset("alice").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(app.store.datasets().len(), 1);
    assert_eq!(app.store.rollbacks(), 1);
}

#[tokio::test]
async fn failed_object_delete_keeps_record() {
    let app = app_with_alice(MemoryObjectStore::new());
    app.state.datasets.upload_dataset("alice", files(&["1.png"])).await.unwrap();
    app.objects.fail_deletes(true);

    let err = app.state.datasets.delete_dataset("alice").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert_eq!(app.store.datasets().len(), 1);
    assert_eq!(app.objects.keys().len(), 1);
}

#[tokio::test]
async fn failed_delete_on_a_later_page_keeps_record_and_unreached_objects() {
    let app = app_with_alice(MemoryObjectStore::with_page_size(2));
    app.state
        .datasets
        .upload_dataset("alice", files(&["1.png", "2.png", "3.png", "4.png", "5.png"]))
        .await
        .unwrap();
    app.objects.fail_delete_on_call(2);

    let err = app.state.datasets.delete_dataset("alice").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    // The first page is already gone; the failed page and the rest stay.
    assert_eq!(
        app.objects.keys(),
        vec!["inst-1/alice/3.png", "inst-1/alice/4.png", "inst-1/alice/5.png"]
    );
    assert_eq!(app.objects.delete_calls(), 2);
    assert_eq!(app.store.datasets().len(), 1);
    assert_eq!(app.store.rollbacks(), 1);
    assert_eq!(app.store.open_transactions(), 0);
}

#[tokio::test]
async fn presigned_listings_follow_prefixes() {
    let app = app_with_alice(MemoryObjectStore::with_page_size(1));
    app.store.seed_user(user("bob", "inst-2", "admin"));
    app.state.datasets.upload_dataset("alice", files(&["1.png", "2.png"])).await.unwrap();
    app.state.datasets.upload_dataset("bob", files(&["1.png"])).await.unwrap();

    let all = app.state.datasets.list_datasets().await.unwrap();
    assert_eq!(all.len(), 3);

    let alice = app.state.datasets.datasets_by_username("inst-1", "alice").await.unwrap();
    assert_eq!(alice.len(), 2);
    assert!(alice.iter().all(|url| url.contains("inst-1/alice/")));

    let records = app.state.datasets.dataset_records().await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn presign_failure_is_reported() {
    let app = app_with_alice(MemoryObjectStore::new());
    app.state.datasets.upload_dataset("alice", files(&["1.png"])).await.unwrap();
    app.objects.fail_presigns(true);

    let err = app.state.datasets.list_datasets().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upstream);
}
