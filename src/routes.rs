use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware_layer, state::AppState};

/// Largest accepted request body; dataset uploads carry every image at once.
pub const MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

/// Builds the API router. Everything except ping, register and login sits
/// behind `require_auth`.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/ping", get(handlers::auth::ping))
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login));

    let protected_routes = Router::new()
        .route("/api/users", get(handlers::users::list_users))
        .route("/api/users/detail/{username}", get(handlers::users::get_user))
        .route("/api/users/institutions", get(handlers::users::list_institutions))
        .route(
            "/api/roles",
            get(handlers::roles::list_roles)
                .post(handlers::roles::create_role)
                .put(handlers::roles::update_role),
        )
        .route(
            "/api/roles/menus",
            get(handlers::roles::list_menus)
                .post(handlers::roles::create_menu)
                .put(handlers::roles::update_menu),
        )
        .route("/api/roles/menus/{id}", delete(handlers::roles::delete_menu))
        .route(
            "/api/roles/mappings",
            get(handlers::roles::list_mappings)
                .post(handlers::roles::create_mapping)
                .put(handlers::roles::update_mapping),
        )
        .route(
            "/api/datasets",
            get(handlers::datasets::list_datasets).post(handlers::datasets::upload_dataset),
        )
        .route("/api/datasets/records", get(handlers::datasets::dataset_records))
        .route(
            "/api/datasets/model-training-history",
            post(handlers::datasets::training_history),
        )
        .route(
            "/api/datasets/train-model/{institution_id}",
            post(handlers::datasets::submit_training),
        )
        .route(
            "/api/datasets/last-train-model/{institution_id}",
            get(handlers::datasets::last_training),
        )
        .route("/api/datasets/{username}", delete(handlers::datasets::delete_dataset))
        .route(
            "/api/datasets/by-user/{institution_id}/{username}",
            get(handlers::datasets::datasets_by_username),
        )
        .route(
            "/api/params",
            get(handlers::params::list_params)
                .post(handlers::params::create_param)
                .put(handlers::params::set_param),
        )
        .route(
            "/api/params/{key}",
            get(handlers::params::get_param).delete(handlers::params::delete_param),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
