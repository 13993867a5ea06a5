use tokio_postgres::{Client, Row};
use crate::{
    error::Result,
    models::dataset::Dataset,
};

fn row_to_dataset(row: &Row) -> Result<Dataset> {
    Ok(Dataset {
        username: row.try_get("username")?,
        bucket_path: row.try_get("dataset")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Lists dataset rows, optionally restricted to one username.
pub async fn list_datasets(client: &Client, username: Option<&str>) -> Result<Vec<Dataset>> {
    let rows = match username {
        Some(username) => {
            client
                .query(
                    "SELECT username, dataset, created_at FROM face_datasets WHERE username = $1",
                    &[&username],
                )
                .await?
        }
        None => {
            client
                .query(
                    "SELECT username, dataset, created_at FROM face_datasets ORDER BY username ASC",
                    &[],
                )
                .await?
        }
    };
    rows.iter().map(row_to_dataset).collect()
}

pub async fn insert_dataset(client: &Client, dataset: &Dataset) -> Result<()> {
    client
        .execute(
            "INSERT INTO face_datasets (username, dataset, created_at) VALUES ($1, $2, $3)",
            &[&dataset.username, &dataset.bucket_path, &dataset.created_at],
        )
        .await?;
    Ok(())
}

pub async fn delete_datasets(client: &Client, username: &str) -> Result<u64> {
    let deleted = client
        .execute("DELETE FROM face_datasets WHERE username = $1", &[&username])
        .await?;
    Ok(deleted)
}
