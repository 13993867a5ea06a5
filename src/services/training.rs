use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        session::Actor,
        training::{TrainingDispatch, TrainingFilter, TrainingJob, TrainingQuery, STATUS_STARTED},
    },
    queue::JobQueue,
    store::{rollback_after_failure, MetadataStore},
};

/// Creates training job records and dispatches them to the training queue.
#[derive(Clone)]
pub struct TrainingJobOrchestrator {
    store: Arc<dyn MetadataStore>,
    queue: Arc<dyn JobQueue>,
    bucket: String,
    queue_name: String,
}

impl TrainingJobOrchestrator {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        queue: Arc<dyn JobQueue>,
        bucket: impl Into<String>,
        queue_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            queue,
            bucket: bucket.into(),
            queue_name: queue_name.into(),
        }
    }

    /// Records a `STARTED` job for the institution and publishes it.
    ///
    /// The record is committed only after the publish succeeds. If the commit
    /// itself fails after a successful publish, the training system holds a
    /// job id that was never recorded.
    pub async fn submit_training(&self, institution_id: &str, actor: &Actor) -> Result<Uuid> {
        if institution_id.trim().is_empty() {
            return Err(AppError::Validation("institution_id is required".to_string()));
        }

        let job = TrainingJob {
            id: Uuid::new_v4(),
            institution_id: institution_id.to_string(),
            status: STATUS_STARTED.to_string(),
            is_used: false,
            created_at: Utc::now(),
            created_by: actor.username.clone(),
        };

        let mut tx = self.store.begin().await?;

        if let Err(e) = tx.insert_training_job(&job).await {
            rollback_after_failure(tx, "submit_training").await;
            return Err(e);
        }

        let dispatch = TrainingDispatch {
            bucket_name: self.bucket.clone(),
            prefix: job.institution_id.clone(),
            created_by: job.created_by.clone(),
            id: job.id,
        };

        if let Err(e) = self.dispatch(&dispatch).await {
            tracing::error!("❌ Training dispatch for job {} failed: {}", job.id, e);
            rollback_after_failure(tx, "submit_training").await;
            return Err(e);
        }

        if let Err(e) = tx.commit().await {
            tracing::error!(
                "❌ Job {} was dispatched but its record failed to commit: {}",
                job.id,
                e
            );
            return Err(e);
        }

        tracing::info!(
            "🚀 Training job {} submitted for {} by {}",
            job.id,
            job.institution_id,
            job.created_by
        );
        Ok(job.id)
    }

    async fn dispatch(&self, dispatch: &TrainingDispatch) -> Result<()> {
        let payload = sonic_rs::to_vec(dispatch)
            .map_err(|e| AppError::Internal(format!("Dispatch serialization failed: {}", e)))?;
        self.queue.declare_queue(&self.queue_name).await?;
        self.queue.publish(&self.queue_name, &payload).await
    }

    /// Jobs matching every present filter field, newest first unless the
    /// filter asks for an allow-listed ordering.
    pub async fn training_history(&self, filter: &TrainingFilter) -> Result<Vec<TrainingJob>> {
        let query = TrainingQuery::try_from(filter)?;
        self.store.training_history(&query).await
    }

    /// When the institution last submitted a training job.
    pub async fn last_training_at(&self, institution_id: &str) -> Result<DateTime<Utc>> {
        if institution_id.trim().is_empty() {
            return Err(AppError::Validation("institution_id is required".to_string()));
        }
        self.store
            .last_training_at(institution_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No training jobs for institution {}", institution_id))
            })
    }
}
