use chrono::{Duration, Utc};
use facegate::{
    error::{AppError, ErrorKind},
    models::{
        session::Actor,
        training::{TrainingFilter, TrainingJob, STATUS_STARTED},
    },
    testing::TestApp,
};
use serde_json::Value;
use uuid::Uuid;

fn actor() -> Actor {
    Actor {
        username: "alice".to_string(),
        role_id: "admin".to_string(),
    }
}

fn job(institution_id: &str, status: &str, hours_ago: i64, created_by: &str) -> TrainingJob {
    TrainingJob {
        id: Uuid::new_v4(),
        institution_id: institution_id.to_string(),
        status: status.to_string(),
        is_used: false,
        created_at: Utc::now() - Duration::hours(hours_ago),
        created_by: created_by.to_string(),
    }
}

#[tokio::test]
async fn submit_records_started_job_and_publishes_it() {
    let app = TestApp::new();

    let id = app.state.training.submit_training("inst-1", &actor()).await.unwrap();

    let jobs = app.store.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, id);
    assert_eq!(jobs[0].status, STATUS_STARTED);
    assert!(!jobs[0].is_used);
    assert_eq!(jobs[0].created_by, "alice");

    let messages = app.queue.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "TrainModel");
    let body: Value = serde_json::from_slice(&messages[0].1).unwrap();
    assert_eq!(body["bucket_name"], "face-dataset");
    assert_eq!(body["prefix"], "inst-1");
    assert_eq!(body["created_by"], "alice");
    assert_eq!(body["id"], id.to_string());

    assert_eq!(app.queue.declared(), vec!["TrainModel"]);

    let history = app
        .state
        .training
        .training_history(&TrainingFilter::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, id);
    assert_eq!(history[0].institution_id, "inst-1");
}

#[tokio::test]
async fn failed_publish_leaves_no_record() {
    let app = TestApp::new();
    app.queue.fail_publishes(true);

    let err = app.state.training.submit_training("inst-1", &actor()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert!(app.store.jobs().is_empty());
    assert_eq!(app.store.rollbacks(), 1);
    assert_eq!(app.store.open_transactions(), 0);
}

#[tokio::test]
async fn failed_declare_publishes_nothing() {
    let app = TestApp::new();
    app.queue.fail_declares(true);

    assert!(app.state.training.submit_training("inst-1", &actor()).await.is_err());
    assert!(app.queue.messages().is_empty());
    assert!(app.store.jobs().is_empty());
}

#[tokio::test]
async fn commit_failure_after_publish_is_reported() {
    let app = TestApp::new();
    app.store.fail_commits(true);

    assert!(app.state.training.submit_training("inst-1", &actor()).await.is_err());
    assert_eq!(app.queue.messages().len(), 1);
    assert!(app.store.jobs().is_empty());
}

#[tokio::test]
async fn blank_institution_is_invalid() {
    let app = TestApp::new();
    let result = app.state.training.submit_training("  ", &actor()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(app.store.transactions_begun(), 0);
}

#[tokio::test]
async fn history_filters_and_orders() {
    let app = TestApp::new();
    app.store.seed_job(job("inst-1", "STARTED", 3, "carol"));
    app.store.seed_job(job("inst-1", "DONE", 1, "alice"));
    app.store.seed_job(job("inst-2", "DONE", 2, "bob"));

    // Newest first by default.
    let inst1 = app
        .state
        .training
        .training_history(&TrainingFilter {
            institution_id: Some("inst-1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let creators: Vec<&str> = inst1.iter().map(|j| j.created_by.as_str()).collect();
    assert_eq!(creators, vec!["alice", "carol"]);

    // Status filter applies without an institution.
    let done = app
        .state
        .training
        .training_history(&TrainingFilter {
            status: Some("DONE".to_string()),
            order_by: Some("created_by".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let creators: Vec<&str> = done.iter().map(|j| j.created_by.as_str()).collect();
    assert_eq!(creators, vec!["alice", "bob"]);

    let rejected = app
        .state
        .training
        .training_history(&TrainingFilter {
            order_by: Some("password".to_string()),
            ..Default::default()
        })
        .await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn last_training_is_the_newest_job_of_the_institution() {
    let app = TestApp::new();
    let newest = job("inst-1", "DONE", 1, "alice");
    app.store.seed_job(job("inst-1", "DONE", 5, "alice"));
    app.store.seed_job(newest.clone());
    app.store.seed_job(job("inst-2", "DONE", 0, "bob"));

    let at = app.state.training.last_training_at("inst-1").await.unwrap();
    assert_eq!(at, newest.created_at);

    let none = app.state.training.last_training_at("inst-3").await;
    assert!(matches!(none, Err(AppError::NotFound(_))));
}
