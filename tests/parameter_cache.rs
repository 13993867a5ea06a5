use facegate::{
    error::AppError,
    models::session::Actor,
    testing::TestApp,
};

fn actor() -> Actor {
    Actor {
        username: "alice".to_string(),
        role_id: "admin".to_string(),
    }
}

#[tokio::test]
async fn set_then_get_is_served_from_cache() {
    let app = TestApp::new();

    app.state
        .params
        .set("threshold", "0.82", "match threshold", &actor())
        .await
        .unwrap();
    let param = app.state.params.get("threshold").await.unwrap();

    assert_eq!(param.value, "0.82");
    assert_eq!(param.updated_by, "alice");
    assert_eq!(app.store.param_reads(), 0);
    assert_eq!(app.cache.hits(), 1);
}

#[tokio::test]
async fn cold_get_reads_store_once_then_caches() {
    let app = TestApp::new();
    app.store.seed_param("threshold", "0.75");

    assert_eq!(app.state.params.get("threshold").await.unwrap().value, "0.75");
    assert_eq!(app.state.params.get("threshold").await.unwrap().value, "0.75");

    assert_eq!(app.store.param_reads(), 1);
    assert_eq!(app.cache.sets(), 1);
}

#[tokio::test]
async fn expired_entry_is_reloaded_from_store() {
    let app = TestApp::new();
    app.store.seed_param("threshold", "0.75");
    app.state.params.get("threshold").await.unwrap();

    app.cache.expire("threshold");
    app.state.params.get("threshold").await.unwrap();

    assert_eq!(app.store.param_reads(), 2);
}

#[tokio::test]
async fn missing_key_is_not_found() {
    let app = TestApp::new();
    let result = app.state.params.get("nope").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn unreadable_cache_falls_back_to_store() {
    let app = TestApp::new();
    app.store.seed_param("threshold", "0.75");
    app.cache.fail_gets(true);

    assert_eq!(app.state.params.get("threshold").await.unwrap().value, "0.75");
    assert_eq!(app.store.param_reads(), 1);
}

#[tokio::test]
async fn failed_cache_write_during_populate_still_returns_value() {
    let app = TestApp::new();
    app.store.seed_param("threshold", "0.75");
    app.cache.fail_sets(true);

    assert_eq!(app.state.params.get("threshold").await.unwrap().value, "0.75");
}

#[tokio::test]
async fn failed_cache_write_on_set_is_reported_after_store_write() {
    let app = TestApp::new();
    app.cache.fail_sets(true);

    let result = app.state.params.set("threshold", "0.9", "", &actor()).await;

    assert!(result.is_err());
    assert_eq!(app.store.param("threshold").unwrap().value, "0.9");
}

#[tokio::test]
async fn delete_removes_store_row_and_cache_entry() {
    let app = TestApp::new();
    app.state.params.set("threshold", "0.9", "", &actor()).await.unwrap();

    app.state.params.delete("threshold").await.unwrap();

    assert!(app.store.param("threshold").is_none());
    assert!(app.cache.peek("threshold").is_none());
    assert!(matches!(
        app.state.params.get("threshold").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_missing_key_is_not_found() {
    let app = TestApp::new();
    let result = app.state.params.delete("nope").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn failed_store_delete_leaves_cache_entry() {
    let app = TestApp::new();
    app.state.params.set("threshold", "0.9", "", &actor()).await.unwrap();
    app.store.fail_param_writes(true);

    let result = app.state.params.delete("threshold").await;

    assert!(result.is_err());
    assert!(app.cache.peek("threshold").is_some());
    assert_eq!(app.store.param("threshold").unwrap().value, "0.9");
}

#[tokio::test]
async fn failed_store_write_on_set_skips_cache() {
    let app = TestApp::new();
    app.store.fail_param_writes(true);

    let result = app.state.params.set("threshold", "0.9", "", &actor()).await;

    assert!(result.is_err());
    assert_eq!(app.cache.sets(), 0);
    assert!(app.cache.peek("threshold").is_none());
    assert!(app.store.param("threshold").is_none());
}

#[tokio::test]
async fn create_rejects_duplicates_and_leaves_cache_alone() {
    let app = TestApp::new();

    app.state.params.create("threshold", "0.8", "", &actor()).await.unwrap();
    let duplicate = app.state.params.create("threshold", "0.9", "", &actor()).await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    assert_eq!(app.cache.sets(), 0);
    assert_eq!(app.state.params.list().await.unwrap().len(), 1);
}
