use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A key-value configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}
