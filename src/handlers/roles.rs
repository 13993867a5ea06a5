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

#[derive(Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[garde(custom(rules::present), length(max = 100))]
    pub role_name: String,
    #[garde(skip)]
    pub role_desc: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[garde(custom(rules::present))]
    pub id: String,
    #[garde(custom(rules::present), length(max = 100))]
    pub role_name: String,
    #[garde(skip)]
    pub role_desc: Option<String>,
    #[garde(skip)]
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Deserialize, Validate)]
pub struct CreateMenuRequest {
    #[garde(custom(rules::present), length(max = 100))]
    pub menu_name: String,
    #[garde(custom(rules::present), length(max = 255))]
    pub menu_route: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateMenuRequest {
    #[garde(custom(rules::present))]
    pub id: String,
    #[garde(custom(rules::present), length(max = 100))]
    pub menu_name: String,
    #[garde(custom(rules::present), length(max = 255))]
    pub menu_route: String,
}

#[derive(Deserialize, Validate)]
pub struct CreateMappingRequest {
    #[garde(custom(rules::present))]
    pub role_id: String,
    #[garde(custom(rules::present))]
    pub menu_id: String,
    #[garde(custom(rules::present))]
    pub access_method: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateMappingRequest {
    #[garde(range(min = 1))]
    pub id: i64,
    #[garde(custom(rules::present))]
    pub access_method: String,
}

pub async fn list_roles(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let roles = state.roles.list_roles().await?;
    Ok(ApiResponse::ok("Roles retrieved", roles))
}

pub async fn create_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = state
        .roles
        .create_role(&payload.role_name, payload.role_desc, &actor)
        .await?;
    Ok(ApiResponse::created("Role created", role))
}

pub async fn update_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .roles
        .update_role(
            &payload.id,
            &payload.role_name,
            payload.role_desc,
            payload.is_active,
            &actor,
        )
        .await?;
    Ok(ApiResponse::message("Role updated"))
}

pub async fn list_menus(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let menus = state.roles.list_menus().await?;
    Ok(ApiResponse::ok("Menus retrieved", menus))
}

pub async fn create_menu(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateMenuRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let menu = state
        .roles
        .create_menu(&payload.menu_name, &payload.menu_route, &actor)
        .await?;
    Ok(ApiResponse::created("Menu created", menu))
}

pub async fn update_menu(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<UpdateMenuRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .roles
        .update_menu(&payload.id, &payload.menu_name, &payload.menu_route, &actor)
        .await?;
    Ok(ApiResponse::message("Menu updated"))
}

pub async fn delete_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.roles.delete_menu(&id).await?;
    Ok(ApiResponse::message("Menu deleted"))
}

pub async fn list_mappings(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let mappings = state.roles.list_mappings().await?;
    Ok(ApiResponse::ok("Mappings retrieved", mappings))
}

pub async fn create_mapping(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateMappingRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .roles
        .create_mapping(&payload.role_id, &payload.menu_id, &payload.access_method, &actor)
        .await?;
    Ok(ApiResponse::created("Mapping created", ()))
}

pub async fn update_mapping(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<UpdateMappingRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .roles
        .update_mapping(payload.id, &payload.access_method, &actor)
        .await?;
    Ok(ApiResponse::message("Mapping updated"))
}
