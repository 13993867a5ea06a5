use axum::{extract::State, response::IntoResponse, Json};
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::Result,
    handlers::response::ApiResponse,
    services::auth::NewUser,
    state::AppState,
    validation::auth as rules,
};

/// The request payload for user registration.
#[derive(Deserialize, Debug, Validate)]
pub struct RegisterRequest {
    #[garde(custom(rules::username))]
    pub username: String,
    #[garde(email)]
    pub email: String,
    #[garde(custom(rules::password))]
    pub password: String,
    #[garde(custom(rules::present), length(max = 255))]
    pub fullname: String,
    #[garde(custom(rules::present), length(max = 64))]
    pub shortname: String,
    #[garde(custom(rules::present))]
    pub role_id: String,
    #[garde(custom(rules::path_segment))]
    pub institution_id: String,
}

/// The request payload for user login.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(custom(rules::present))]
    pub username: String,
    #[garde(custom(rules::present))]
    pub password: String,
}

pub async fn ping() -> impl IntoResponse {
    ApiResponse::ok("pong", "pong")
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!("📝 Register attempt: {}", payload.username);
    payload.validate()?;

    let user = state
        .users
        .register(NewUser {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            fullname: payload.fullname,
            shortname: payload.shortname,
            role_id: payload.role_id,
            institution_id: payload.institution_id,
        })
        .await?;

    Ok(ApiResponse::created("Registration successful", user))
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!("🔐 Login attempt: {}", payload.username);
    payload.validate()?;

    let session = state.users.login(&payload.username, &payload.password).await?;

    Ok(ApiResponse::ok("Login successful", session))
}
