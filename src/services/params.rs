use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::{
    cache::CacheStore,
    error::{AppError, Result},
    models::{param::Parameter, session::Actor},
    store::MetadataStore,
};

/// Read-through, write-invalidated cache in front of the parameter table.
///
/// The store is authoritative. Cache entries expire after `ttl` or when
/// written/deleted through this type.
#[derive(Clone)]
pub struct ParameterCache {
    store: Arc<dyn MetadataStore>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

fn require_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(AppError::Validation("Parameter key is required".to_string()));
    }
    Ok(())
}

fn encode(param: &Parameter) -> Result<String> {
    sonic_rs::to_string(param)
        .map_err(|e| AppError::Internal(format!("Parameter serialization failed: {}", e)))
}

impl ParameterCache {
    pub fn new(store: Arc<dyn MetadataStore>, cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    pub async fn get(&self, key: &str) -> Result<Parameter> {
        require_key(key)?;

        match self.cache.get(key).await {
            Ok(Some(raw)) => match sonic_rs::from_str::<Parameter>(&raw) {
                Ok(param) => {
                    tracing::debug!("⚡ Parameter cache hit: {}", key);
                    return Ok(param);
                }
                Err(e) => tracing::warn!("⚠️ Undecodable cache entry for {}: {}", key, e),
            },
            Ok(None) => tracing::debug!("Parameter cache miss: {}", key),
            Err(e) => tracing::warn!("⚠️ Parameter cache read failed for {}: {}", key, e),
        }

        let param = self
            .store
            .get_param(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Parameter {} not found", key)))?;

        self.populate(&param).await;
        Ok(param)
    }

    /// Best effort: failures are logged and never fail the read.
    async fn populate(&self, param: &Parameter) {
        let raw = match encode(param) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("⚠️ Not caching {}: {}", param.key, e);
                return;
            }
        };
        if let Err(e) = self.cache.set_ex(&param.key, &raw, self.ttl).await {
            tracing::warn!("⚠️ Failed to cache parameter {}: {}", param.key, e);
        }
    }

    /// Every parameter, read straight from the store.
    pub async fn list(&self) -> Result<Vec<Parameter>> {
        self.store.list_params().await
    }

    /// Inserts a new parameter. The cache is filled lazily by `get`.
    pub async fn create(
        &self,
        key: &str,
        value: &str,
        description: &str,
        actor: &Actor,
    ) -> Result<Parameter> {
        require_key(key)?;
        let param = Parameter {
            key: key.to_string(),
            value: value.to_string(),
            description: description.to_string(),
            updated_at: Utc::now(),
            updated_by: actor.username.clone(),
        };
        self.store.insert_param(&param).await?;
        tracing::info!("✅ Parameter {} created by {}", key, actor.username);
        Ok(param)
    }

    /// Writes the store first, then overwrites the cache entry.
    ///
    /// A cache failure after a successful store write is reported as a
    /// failure; the next `get` miss repairs the entry.
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        description: &str,
        actor: &Actor,
    ) -> Result<Parameter> {
        require_key(key)?;
        let param = Parameter {
            key: key.to_string(),
            value: value.to_string(),
            description: description.to_string(),
            updated_at: Utc::now(),
            updated_by: actor.username.clone(),
        };

        self.store.upsert_param(&param).await?;

        let raw = encode(&param)?;
        if let Err(e) = self.cache.set_ex(&param.key, &raw, self.ttl).await {
            tracing::error!("❌ Parameter {} stored but cache refresh failed: {}", key, e);
            return Err(e);
        }

        tracing::info!("✅ Parameter {} updated by {}", key, actor.username);
        Ok(param)
    }

    /// Deletes from the store, then drops the cache entry.
    pub async fn delete(&self, key: &str) -> Result<()> {
        require_key(key)?;

        let removed = self.store.delete_param(key).await?;
        self.cache.del(key).await?;

        if removed == 0 {
            return Err(AppError::NotFound(format!("Parameter {} not found", key)));
        }

        tracing::info!("🗑️ Parameter {} deleted", key);
        Ok(())
    }
}
