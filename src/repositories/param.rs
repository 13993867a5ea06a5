use tokio_postgres::{Client, Row};
use crate::{
    error::Result,
    models::param::Parameter,
};

fn row_to_param(row: &Row) -> Result<Parameter> {
    Ok(Parameter {
        key: row.try_get("id")?,
        value: row.try_get("value")?,
        description: row.try_get("description")?,
        updated_at: row.try_get("updated_at")?,
        updated_by: row.try_get("updated_by")?,
    })
}

pub async fn get_param(client: &Client, key: &str) -> Result<Option<Parameter>> {
    let row = client
        .query_opt(
            "SELECT id, value, description, updated_at, updated_by FROM parameter WHERE id = $1",
            &[&key],
        )
        .await?;
    row.map(|r| row_to_param(&r)).transpose()
}

pub async fn list_params(client: &Client) -> Result<Vec<Parameter>> {
    let rows = client
        .query(
            "SELECT id, value, description, updated_at, updated_by FROM parameter ORDER BY id ASC",
            &[],
        )
        .await?;
    rows.iter().map(row_to_param).collect()
}

pub async fn insert_param(client: &Client, param: &Parameter) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO parameter (id, value, description, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            &[
                &param.key,
                &param.value,
                &param.description,
                &param.updated_at,
                &param.updated_by,
            ],
        )
        .await?;
    Ok(())
}

pub async fn upsert_param(client: &Client, param: &Parameter) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO parameter (id, value, description, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET value = EXCLUDED.value,
                description = EXCLUDED.description,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
            &[
                &param.key,
                &param.value,
                &param.description,
                &param.updated_at,
                &param.updated_by,
            ],
        )
        .await?;
    Ok(())
}

pub async fn delete_param(client: &Client, key: &str) -> Result<u64> {
    let deleted = client
        .execute("DELETE FROM parameter WHERE id = $1", &[&key])
        .await?;
    Ok(deleted)
}
