use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    handlers::response::ApiResponse,
    models::{
        dataset::AttachedFile,
        session::Actor,
        training::TrainingFilter,
    },
    state::AppState,
};

#[derive(Serialize)]
struct SubmittedJob {
    id: uuid::Uuid,
}

#[derive(Serialize)]
struct LastTraining {
    created_at: chrono::DateTime<chrono::Utc>,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e))
}

/// Accepts a `username` field and one or more `file` fields.
#[axum::debug_handler]
pub async fn upload_dataset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut username = String::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("username") => {
                username = field.text().await.map_err(multipart_error)?;
            }
            Some("file") => {
                let name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::Validation("File name is required".to_string()))?;
                let content = field.bytes().await.map_err(multipart_error)?;
                tracing::debug!("📦 Received {} ({} bytes)", name, content.len());
                files.push(AttachedFile::new(name, content.to_vec()));
            }
            other => {
                tracing::debug!("Ignoring multipart field {:?}", other);
            }
        }
    }

    let count = files.len();
    state.datasets.upload_dataset(username.trim(), files).await?;

    Ok(ApiResponse::created(format!("{} file(s) uploaded", count), ()))
}

pub async fn list_datasets(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let urls = state.datasets.list_datasets().await?;
    Ok(ApiResponse::ok("Datasets retrieved", urls))
}

pub async fn dataset_records(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let records = state.datasets.dataset_records().await?;
    Ok(ApiResponse::ok("Dataset records retrieved", records))
}

pub async fn datasets_by_username(
    State(state): State<AppState>,
    Path((institution_id, username)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let urls = state
        .datasets
        .datasets_by_username(&institution_id, &username)
        .await?;
    Ok(ApiResponse::ok("Datasets retrieved", urls))
}

pub async fn delete_dataset(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    state.datasets.delete_dataset(&username).await?;
    Ok(ApiResponse::message("Dataset deleted"))
}

pub async fn submit_training(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(institution_id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = state.training.submit_training(&institution_id, &actor).await?;
    Ok(ApiResponse::created("Training submitted", SubmittedJob { id }))
}

pub async fn last_training(
    State(state): State<AppState>,
    Path(institution_id): Path<String>,
) -> Result<impl IntoResponse> {
    let created_at = state.training.last_training_at(&institution_id).await?;
    Ok(ApiResponse::ok("Last training retrieved", LastTraining { created_at }))
}

pub async fn training_history(
    State(state): State<AppState>,
    Json(filter): Json<TrainingFilter>,
) -> Result<impl IntoResponse> {
    let jobs = state.training.training_history(&filter).await?;
    Ok(ApiResponse::ok("Training history retrieved", jobs))
}
