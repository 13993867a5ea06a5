use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use crate::crypto::password::{hash_password, verify_password};
use crate::crypto::token::TokenSigner;
use crate::error::{AppError, Result};
use crate::models::user::{LoginResponse, User};
use crate::store::MetadataStore;

/// Fields required to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub fullname: String,
    pub shortname: String,
    pub role_id: String,
    pub institution_id: String,
}

/// Registration, login and user lookups.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn MetadataStore>,
    tokens: TokenSigner,
}

impl UserService {
    pub fn new(store: Arc<dyn MetadataStore>, tokens: TokenSigner) -> Self {
        Self { store, tokens }
    }

    /// Creates a new user.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `User`.
    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        tracing::debug!("🔐 Creating user: {}", new_user.username);

        let user = User {
            password_hash: hash_password(&new_user.password)?,
            username: new_user.username,
            email: new_user.email,
            fullname: new_user.fullname,
            shortname: new_user.shortname,
            role_id: new_user.role_id,
            institution_id: new_user.institution_id,
            created_at: Utc::now(),
        };

        self.store.create_user(&user).await?;

        tracing::info!("✅ User created: {}", user.username);
        Ok(user)
    }

    /// Authenticates a user and issues a token carrying their menu access.
    ///
    /// # Returns
    ///
    /// A `Result` containing the profile, token and menu mappings.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        tracing::debug!("🔐 Authenticating user: {}", username);

        let invalid = || AppError::Authentication("Invalid username or password".to_string());

        let user = self.store.find_user(username).await?.ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        let mappings = self.store.mappings_for_role(&user.role_id).await?;
        if mappings.is_empty() {
            return Err(AppError::Validation("menu role mapping not found".to_string()));
        }

        let menu_access: BTreeMap<String, String> = mappings
            .iter()
            .map(|m| (m.menu_id.clone(), m.access_method.clone()))
            .collect();

        let claims = self
            .tokens
            .claims_for(&user.username, &user.role_id, menu_access, Utc::now());
        let token = self.tokens.issue(&claims)?;

        tracing::info!("✅ User authenticated: {}", user.username);

        Ok(LoginResponse {
            username: user.username,
            fullname: user.fullname,
            shortname: user.shortname,
            role: user.role_id,
            token,
            institution_id: user.institution_id,
            menu_mapping: mappings,
        })
    }

    pub async fn get_user(&self, username: &str) -> Result<User> {
        self.store
            .find_user(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.store.list_users().await
    }

    pub async fn list_institutions(&self) -> Result<Vec<String>> {
        self.store.list_institutions().await
    }
}
