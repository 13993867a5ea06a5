use chrono::Utc;
use facegate::{
    error::AppError,
    models::session::Actor,
    services::{access, auth::NewUser},
    testing::TestApp,
};

fn new_user(username: &str, role_id: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: "SecurePass123!".to_string(),
        fullname: "Test User".to_string(),
        shortname: "Test".to_string(),
        role_id: role_id.to_string(),
        institution_id: "inst-1".to_string(),
    }
}

fn admin() -> Actor {
    Actor {
        username: "root".to_string(),
        role_id: "admin".to_string(),
    }
}

#[tokio::test]
async fn login_token_carries_the_role_menu_access() {
    let app = TestApp::new();
    app.store.grant("operator", "operator", "GET,POST");
    app.store.grant("operator", "reports", "GET");
    app.state.users.register(new_user("alice", "operator")).await.unwrap();

    let session = app.state.users.login("alice", "SecurePass123!").await.unwrap();
    assert_eq!(session.role, "operator");
    assert_eq!(session.menu_mapping.len(), 2);

    let claims = app.state.tokens.verify(&session.token, Utc::now()).unwrap();
    assert_eq!(claims.subject, "alice");
    assert_eq!(claims.menu_access.get("operator").map(String::as_str), Some("GET,POST"));

    assert!(access::authorize(&claims, "operator", "POST").is_allowed());
    assert!(!access::authorize(&claims, "operator", "DELETE").is_allowed());
    // Only the menu named after the role is ever granted.
    assert!(!access::authorize(&claims, "reports", "GET").is_allowed());
}

#[tokio::test]
async fn login_without_mappings_is_invalid() {
    let app = TestApp::new();
    app.state.users.register(new_user("alice", "orphan")).await.unwrap();

    let result = app.state.users.login("alice", "SecurePass123!").await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn stored_password_is_hashed() {
    let app = TestApp::new();
    let user = app.state.users.register(new_user("alice", "admin")).await.unwrap();

    assert_ne!(user.password_hash, "SecurePass123!");
    assert!(user.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn user_lookups() {
    let app = TestApp::new();
    app.state.users.register(new_user("alice", "admin")).await.unwrap();

    assert_eq!(app.state.users.get_user("alice").await.unwrap().username, "alice");
    assert!(matches!(
        app.state.users.get_user("ghost").await,
        Err(AppError::NotFound(_))
    ));
    assert_eq!(app.state.users.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn role_and_menu_writes_are_stamped_with_the_actor() {
    let app = TestApp::new();

    let role = app
        .state
        .roles
        .create_role("Operator", Some("Runs training".to_string()), &admin())
        .await
        .unwrap();
    assert_eq!(role.created_by, "root");
    assert!(uuid::Uuid::parse_str(&role.id).is_ok());

    app.state
        .roles
        .update_role(&role.id, "Operators", None, false, &admin())
        .await
        .unwrap();
    let roles = app.state.roles.list_roles().await.unwrap();
    assert_eq!(roles[0].role_name, "Operators");
    assert!(!roles[0].is_active);

    let menu = app
        .state
        .roles
        .create_menu("Datasets", "/datasets", &admin())
        .await
        .unwrap();
    app.state
        .roles
        .create_mapping(&role.id, &menu.id, "get, post", &admin())
        .await
        .unwrap();

    let mappings = app.state.roles.list_mappings().await.unwrap();
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].access_method, "GET,POST");
    assert_eq!(mappings[0].menu_route, "/datasets");

    app.state
        .roles
        .update_mapping(mappings[0].id, "GET", &admin())
        .await
        .unwrap();
    assert_eq!(app.state.roles.list_mappings().await.unwrap()[0].access_method, "GET");

    app.state.roles.delete_menu(&menu.id).await.unwrap();
    assert!(app.state.roles.list_menus().await.unwrap().is_empty());
    assert!(app.state.roles.list_mappings().await.unwrap().is_empty());
}

#[tokio::test]
async fn updates_of_missing_rows_are_not_found() {
    let app = TestApp::new();

    assert!(matches!(
        app.state.roles.update_role("nope", "x", None, true, &admin()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        app.state.roles.update_menu("nope", "x", "/x", &admin()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        app.state.roles.delete_menu("nope").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        app.state.roles.update_mapping(42, "GET", &admin()).await,
        Err(AppError::NotFound(_))
    ));
}
