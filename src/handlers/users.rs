use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::Result, handlers::response::ApiResponse, state::AppState};

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let users = state.users.list_users().await?;
    Ok(ApiResponse::ok("Users retrieved", users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    let user = state.users.get_user(&username).await?;
    Ok(ApiResponse::ok("User retrieved", user))
}

pub async fn list_institutions(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let institutions = state.users.list_institutions().await?;
    Ok(ApiResponse::ok("Institutions retrieved", institutions))
}
