use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Status written when a job is submitted. Later states are set by the
/// training system.
pub const STATUS_STARTED: &str = "STARTED";

/// A model-training job record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingJob {
    pub id: Uuid,
    pub institution_id: String,
    pub status: String,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// The message published to the training queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingDispatch {
    pub bucket_name: String,
    pub prefix: String,
    pub created_by: String,
    pub id: Uuid,
}

/// Caller-supplied history filter. Blank strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainingFilter {
    #[serde(default)]
    pub institution_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_used: Option<bool>,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub sort_type: Option<String>,
}

/// Columns history can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    InstitutionId,
    Status,
    IsUsed,
    CreatedAt,
    CreatedBy,
}

impl SortColumn {
    fn parse(field: &str) -> Option<Self> {
        match field.trim().to_ascii_lowercase().as_str() {
            "id" => Some(SortColumn::Id),
            "institution_id" => Some(SortColumn::InstitutionId),
            "status" => Some(SortColumn::Status),
            "is_used" => Some(SortColumn::IsUsed),
            "created_at" => Some(SortColumn::CreatedAt),
            "created_by" => Some(SortColumn::CreatedBy),
            _ => None,
        }
    }

    /// The storage column name. Only ever one of these literals.
    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::InstitutionId => "institution_id",
            SortColumn::Status => "status",
            SortColumn::IsUsed => "is_used",
            SortColumn::CreatedAt => "created_at",
            SortColumn::CreatedBy => "created_by",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A validated history query: every field is either a bound value or a
/// member of a closed enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingQuery {
    pub institution_id: Option<String>,
    pub status: Option<String>,
    pub is_used: Option<bool>,
    pub sort: SortColumn,
    pub direction: SortDirection,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl TryFrom<&TrainingFilter> for TrainingQuery {
    type Error = AppError;

    fn try_from(filter: &TrainingFilter) -> Result<Self> {
        let (sort, direction) = match present(&filter.order_by) {
            None => (SortColumn::CreatedAt, SortDirection::Desc),
            Some(field) => {
                let sort = SortColumn::parse(&field).ok_or_else(|| {
                    AppError::Validation(format!("Cannot order training history by '{}'", field))
                })?;
                let direction = match present(&filter.sort_type)
                    .map(|s| s.to_ascii_lowercase())
                    .as_deref()
                {
                    None | Some("asc") => SortDirection::Asc,
                    Some("desc") => SortDirection::Desc,
                    Some(other) => {
                        return Err(AppError::Validation(format!(
                            "Unknown sort type '{}'",
                            other
                        )));
                    }
                };
                (sort, direction)
            }
        };

        Ok(Self {
            institution_id: present(&filter.institution_id),
            status: present(&filter.status),
            is_used: filter.is_used,
            sort,
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_newest_first() {
        let query = TrainingQuery::try_from(&TrainingFilter::default()).unwrap();
        assert_eq!(query.sort, SortColumn::CreatedAt);
        assert_eq!(query.direction, SortDirection::Desc);
    }

    #[test]
    fn order_by_without_sort_type_is_ascending() {
        let filter = TrainingFilter {
            order_by: Some("status".into()),
            ..Default::default()
        };
        let query = TrainingQuery::try_from(&filter).unwrap();
        assert_eq!(query.sort, SortColumn::Status);
        assert_eq!(query.direction, SortDirection::Asc);
    }

    #[test]
    fn rejects_columns_outside_the_allow_list() {
        let filter = TrainingFilter {
            order_by: Some("created_at; DROP TABLE model_training".into()),
            sort_type: Some("desc".into()),
            ..Default::default()
        };
        assert!(matches!(
            TrainingQuery::try_from(&filter),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_unknown_sort_type() {
        let filter = TrainingFilter {
            order_by: Some("created_at".into()),
            sort_type: Some("sideways".into()),
            ..Default::default()
        };
        assert!(TrainingQuery::try_from(&filter).is_err());
    }

    #[test]
    fn blank_filters_are_ignored() {
        let filter = TrainingFilter {
            institution_id: Some("  ".into()),
            status: Some("DONE".into()),
            ..Default::default()
        };
        let query = TrainingQuery::try_from(&filter).unwrap();
        assert_eq!(query.institution_id, None);
        assert_eq!(query.status.as_deref(), Some("DONE"));
    }
}
