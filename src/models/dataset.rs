use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The metadata row for a user's dataset. One per username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub username: String,
    /// `institution_id/username`, the object-store prefix holding the files.
    pub bucket_path: String,
    pub created_at: DateTime<Utc>,
}

/// A file attached to a dataset upload.
#[derive(Debug, Clone)]
pub struct AttachedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl AttachedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// The dataset prefix for a user inside the bucket.
pub fn bucket_path(institution_id: &str, username: &str) -> String {
    format!("{}/{}", institution_id, username)
}
