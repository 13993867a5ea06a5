use std::sync::Arc;

use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;

use crate::{
    cache::{CacheStore, RedisCache},
    config::Config,
    crypto::token::TokenSigner,
    db::{self, PgStore},
    error::Result,
    queue::{AmqpQueue, JobQueue},
    services::{
        auth::UserService, datasets::DatasetLifecycleManager, params::ParameterCache,
        roles::RoleService, training::TrainingJobOrchestrator,
    },
    storage::{ObjectStore, S3ObjectStore},
    store::MetadataStore,
};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// Verifies the bearer tokens of incoming requests.
    pub tokens: TokenSigner,
    pub users: UserService,
    pub roles: RoleService,
    pub datasets: DatasetLifecycleManager,
    pub training: TrainingJobOrchestrator,
    pub params: ParameterCache,
}

impl AppState {
    /// Connects every backing service and wires the components.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool: Pool = db::create_pool(&config.database_url)?;
        db::ensure_schema(&pool).await?;
        tracing::info!("✅ PostgreSQL Pool initialized with deadpool-postgres");

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis Connection Manager initialized");

        let objects = S3ObjectStore::new(&config.s3);
        tracing::info!("✅ Object store client initialized for bucket {}", config.s3.bucket);

        let queue = AmqpQueue::connect(&config.amqp_url).await?;
        tracing::info!("✅ AMQP channel opened with publisher confirms");

        Ok(Self::from_parts(
            config,
            Arc::new(PgStore::new(pool)),
            Arc::new(objects),
            Arc::new(queue),
            Arc::new(RedisCache::new(redis)),
        ))
    }

    /// Wires the components over already-built collaborators.
    pub fn from_parts(
        config: &Config,
        store: Arc<dyn MetadataStore>,
        objects: Arc<dyn ObjectStore>,
        queue: Arc<dyn JobQueue>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let tokens = TokenSigner::new(
            config.token_secret.clone(),
            config.token_ttl,
        );

        AppState {
            config: config.clone(),
            users: UserService::new(store.clone(), tokens.clone()),
            roles: RoleService::new(store.clone()),
            datasets: DatasetLifecycleManager::new(
                store.clone(),
                objects,
                config.presigned_url_ttl,
            ),
            training: TrainingJobOrchestrator::new(
                store.clone(),
                queue,
                config.s3.bucket.clone(),
                config.training_queue.clone(),
            ),
            params: ParameterCache::new(store, cache, config.param_cache_ttl),
            tokens,
        }
    }
}
