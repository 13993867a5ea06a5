use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The identity and permission snapshot carried by every authenticated call.
///
/// `menu_access` maps a menu id to the comma-separated verbs the role may use
/// against it. It is captured at login and never refreshed for the lifetime
/// of the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The username the token was issued to.
    pub subject: String,
    /// The role the user held at login.
    pub role_id: String,
    /// Allowed verbs per menu, e.g. `"GET,POST"`.
    pub menu_access: BTreeMap<String, String>,
    /// The timestamp when the token was issued.
    pub issued_at: DateTime<Utc>,
    /// The timestamp when the token expires.
    pub expires_at: DateTime<Utc>,
}

/// Who is acting on a request. Attached once authorization succeeds and used
/// as `created_by` / `updated_by` provenance for writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    pub role_id: String,
}
