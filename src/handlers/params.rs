use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::Result,
    handlers::response::ApiResponse,
    models::session::Actor,
    state::AppState,
    validation::auth as rules,
};

/// Body for both creating and overwriting a parameter.
#[derive(Deserialize, Validate)]
pub struct ParamRequest {
    #[garde(custom(rules::present), length(max = 255))]
    pub key: String,
    #[garde(skip)]
    pub value: String,
    #[garde(skip)]
    #[serde(default)]
    pub description: String,
}

pub async fn list_params(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let params = state.params.list().await?;
    Ok(ApiResponse::ok("Parameters retrieved", params))
}

pub async fn get_param(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse> {
    let param = state.params.get(&key).await?;
    Ok(ApiResponse::ok("Parameter retrieved", param))
}

pub async fn create_param(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ParamRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let param = state
        .params
        .create(&payload.key, &payload.value, &payload.description, &actor)
        .await?;
    Ok(ApiResponse::created("Parameter created", param))
}

pub async fn set_param(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ParamRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let param = state
        .params
        .set(&payload.key, &payload.value, &payload.description, &actor)
        .await?;
    Ok(ApiResponse::ok("Parameter updated", param))
}

pub async fn delete_param(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse> {
    state.params.delete(&key).await?;
    Ok(ApiResponse::message("Parameter deleted"))
}
