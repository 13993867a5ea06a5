use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::role::MenuRoleMapping;

/// Represents a user in the system.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    /// The user's username (unique).
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// The user's hashed password.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// The user's full name.
    pub fullname: String,
    /// The user's short display name.
    pub shortname: String,
    /// The role assigned to the user.
    pub role_id: String,
    /// The institution (tenant) the user belongs to.
    pub institution_id: String,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
}

/// Everything a client needs after a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub fullname: String,
    pub shortname: String,
    pub role: String,
    pub token: String,
    pub institution_id: String,
    pub menu_mapping: Vec<MenuRoleMapping>,
}
