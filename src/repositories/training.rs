use chrono::{DateTime, Utc};
use tokio_postgres::{types::ToSql, Client, Row};
use crate::{
    error::Result,
    models::training::{TrainingJob, TrainingQuery},
};

fn row_to_job(row: &Row) -> Result<TrainingJob> {
    Ok(TrainingJob {
        id: row.try_get("id")?,
        institution_id: row.try_get("institution_id")?,
        status: row.try_get("status")?,
        is_used: row.try_get("is_used")?,
        created_at: row.try_get("created_at")?,
        created_by: row.try_get("created_by")?,
    })
}

pub async fn insert_job(client: &Client, job: &TrainingJob) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO model_training (id, institution_id, status, is_used, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
            &[
                &job.id,
                &job.institution_id,
                &job.status,
                &job.is_used,
                &job.created_at,
                &job.created_by,
            ],
        )
        .await?;
    Ok(())
}

/// Builds the history statement. Filter values are always bound parameters;
/// the ORDER BY clause only ever contains allow-listed column literals.
fn history_sql(query: &TrainingQuery) -> String {
    let mut conditions = Vec::new();
    let mut next = 1;
    if query.institution_id.is_some() {
        conditions.push(format!("institution_id = ${}", next));
        next += 1;
    }
    if query.status.is_some() {
        conditions.push(format!("status = ${}", next));
        next += 1;
    }
    if query.is_used.is_some() {
        conditions.push(format!("is_used = ${}", next));
    }

    let mut sql = String::from(
        "SELECT id, institution_id, status, is_used, created_at, created_by FROM model_training",
    );
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&format!(
        " ORDER BY {} {}",
        query.sort.column(),
        query.direction.keyword()
    ));
    sql
}

pub async fn history(client: &Client, query: &TrainingQuery) -> Result<Vec<TrainingJob>> {
    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
    if let Some(institution_id) = &query.institution_id {
        params.push(institution_id);
    }
    if let Some(status) = &query.status {
        params.push(status);
    }
    if let Some(is_used) = &query.is_used {
        params.push(is_used);
    }

    let rows = client.query(history_sql(query).as_str(), &params).await?;
    rows.iter().map(row_to_job).collect()
}

pub async fn last_created_at(client: &Client, institution_id: &str) -> Result<Option<DateTime<Utc>>> {
    let row = client
        .query_opt(
            r#"
            SELECT created_at FROM model_training
            WHERE institution_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            &[&institution_id],
        )
        .await?;
    row.map(|r| Ok(r.try_get::<_, DateTime<Utc>>("created_at")?)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::training::{SortColumn, SortDirection};

    fn query() -> TrainingQuery {
        TrainingQuery {
            institution_id: None,
            status: None,
            is_used: None,
            sort: SortColumn::CreatedAt,
            direction: SortDirection::Desc,
        }
    }

    #[test]
    fn unfiltered_history_has_no_where_clause() {
        assert_eq!(
            history_sql(&query()),
            "SELECT id, institution_id, status, is_used, created_at, created_by FROM model_training ORDER BY created_at DESC"
        );
    }

    #[test]
    fn filters_are_numbered_in_order() {
        let q = TrainingQuery {
            status: Some("DONE".into()),
            is_used: Some(true),
            sort: SortColumn::Status,
            direction: SortDirection::Asc,
            ..query()
        };
        assert!(history_sql(&q).ends_with(
            "WHERE status = $1 AND is_used = $2 ORDER BY status ASC"
        ));
    }
}
