use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A role users can be assigned to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub role_name: String,
    pub role_desc: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

/// A named permission unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    pub id: String,
    pub menu_name: String,
    pub menu_route: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

/// Grants a role a set of verbs against a menu.
///
/// `access_method` is a comma-separated list of HTTP verbs, e.g. `"GET,POST"`.
/// `menu_name`/`menu_route`/`role_name` are joined in when listing and are
/// empty on freshly built values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuRoleMapping {
    pub id: i64,
    pub role_id: String,
    pub role_name: String,
    pub menu_id: String,
    pub menu_name: String,
    pub menu_route: String,
    pub access_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}
