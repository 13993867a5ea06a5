use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::{
    error::{AppError, Result},
    keyed_lock::KeyedLock,
    models::dataset::{bucket_path, AttachedFile, Dataset},
    storage::ObjectStore,
    store::{rollback_after_failure, MetadataStore, MetadataTx},
};

/// Keeps dataset metadata rows and dataset objects consistent across upload
/// and deletion.
///
/// The metadata transaction stays open across the object-store calls and is
/// committed only when they all succeed. Objects already written or deleted
/// are never compensated.
#[derive(Clone)]
pub struct DatasetLifecycleManager {
    store: Arc<dyn MetadataStore>,
    objects: Arc<dyn ObjectStore>,
    locks: KeyedLock,
    presign_ttl: Duration,
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_file_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("File name is required".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(AppError::Validation(format!("Invalid file name: {}", name)));
    }
    Ok(())
}

impl DatasetLifecycleManager {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        objects: Arc<dyn ObjectStore>,
        presign_ttl: Duration,
    ) -> Self {
        Self {
            store,
            objects,
            locks: KeyedLock::new(),
            presign_ttl,
        }
    }

    async fn institution_of(&self, username: &str) -> Result<String> {
        let user = self
            .store
            .find_user(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;
        Ok(user.institution_id)
    }

    /// Stores `files` under `institution_id/username` and records the dataset
    /// row the first time a user uploads.
    pub async fn upload_dataset(&self, username: &str, files: Vec<AttachedFile>) -> Result<()> {
        require(username, "username")?;
        if files.is_empty() {
            return Err(AppError::Validation("At least one file is required".to_string()));
        }
        for file in &files {
            validate_file_name(&file.name)?;
        }

        let _guard = self.locks.acquire(username).await;

        let institution_id = self.institution_of(username).await?;
        let path = bucket_path(&institution_id, username);
        tracing::debug!("📤 Uploading {} file(s) to {}", files.len(), path);

        let mut tx = self.store.begin().await?;

        match self.stage_upload(tx.as_mut(), username, &path, files).await {
            Ok(created) => {
                tx.commit().await?;
                tracing::info!(
                    "✅ Dataset upload for {} committed (new record: {})",
                    username,
                    created
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ Dataset upload for {} failed: {}", username, e);
                rollback_after_failure(tx, "upload_dataset").await;
                Err(e)
            }
        }
    }

    /// Inserts the dataset row if missing, then writes every file. Returns
    /// whether a row was inserted.
    async fn stage_upload(
        &self,
        tx: &mut dyn MetadataTx,
        username: &str,
        path: &str,
        files: Vec<AttachedFile>,
    ) -> Result<bool> {
        let existing = tx.datasets_for(username).await?;
        let created = existing.is_empty();
        if created {
            tx.insert_dataset(&Dataset {
                username: username.to_string(),
                bucket_path: path.to_string(),
                created_at: Utc::now(),
            })
            .await?;
        }

        for file in files {
            let key = format!("{}/{}", path, file.name);
            let content_type = infer::get(&file.content).map(|kind| kind.mime_type());
            self.objects
                .put_object(&key, file.content, content_type)
                .await?;
            tracing::debug!("📦 Stored {}", key);
        }

        Ok(created)
    }

    /// Removes the dataset row and every object under the user's prefix.
    pub async fn delete_dataset(&self, username: &str) -> Result<()> {
        require(username, "username")?;

        let _guard = self.locks.acquire(username).await;

        let institution_id = self.institution_of(username).await?;
        let prefix = format!("{}/", bucket_path(&institution_id, username));

        let mut tx = self.store.begin().await?;

        let removed_rows = match tx.delete_datasets(username).await {
            Ok(rows) => rows,
            Err(e) => {
                rollback_after_failure(tx, "delete_dataset").await;
                return Err(e);
            }
        };

        match self.purge_prefix(&prefix).await {
            Ok(removed_objects) => {
                tx.commit().await?;
                tracing::info!(
                    "🗑️ Dataset for {} deleted ({} row(s), {} object(s))",
                    username,
                    removed_rows,
                    removed_objects
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ Dataset delete for {} failed: {}", username, e);
                rollback_after_failure(tx, "delete_dataset").await;
                Err(e)
            }
        }
    }

    /// Deletes every object under `prefix` page by page.
    async fn purge_prefix(&self, prefix: &str) -> Result<usize> {
        let mut continuation = None;
        let mut removed = 0;
        let mut first_page = true;

        loop {
            let page = self.objects.list_page(prefix, continuation.take()).await?;

            if page.keys.is_empty() && first_page {
                return Err(AppError::NotFound(format!("No objects to delete under {}", prefix)));
            }
            first_page = false;

            if !page.keys.is_empty() {
                self.objects.delete_objects(&page.keys).await?;
                removed += page.keys.len();
            }

            match page.next_token {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(removed)
    }

    /// Presigned URLs for every object in the bucket.
    pub async fn list_datasets(&self) -> Result<Vec<String>> {
        self.presign_prefix("").await
    }

    /// Presigned URLs for every object of one user's dataset.
    pub async fn datasets_by_username(&self, institution_id: &str, username: &str) -> Result<Vec<String>> {
        require(institution_id, "institution_id")?;
        require(username, "username")?;
        let prefix = format!("{}/", bucket_path(institution_id, username));
        self.presign_prefix(&prefix).await
    }

    /// Metadata rows for every dataset.
    pub async fn dataset_records(&self) -> Result<Vec<Dataset>> {
        self.store.list_datasets().await
    }

    async fn presign_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        let mut continuation = None;

        loop {
            let page = self.objects.list_page(prefix, continuation.take()).await?;
            for key in &page.keys {
                urls.push(self.objects.presign_get(key, self.presign_ttl).await?);
            }
            match page.next_token {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        tracing::debug!("🔗 Presigned {} object(s) under '{}'", urls.len(), prefix);
        Ok(urls)
    }
}
