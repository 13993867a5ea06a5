use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use crate::error::{AppError, Result};
use crate::models::{
    dataset::Dataset,
    param::Parameter,
    role::{Menu, MenuRoleMapping, Role},
    training::{TrainingJob, TrainingQuery},
    user::User,
};
use crate::repositories::{
    dataset as dataset_repo, param as param_repo, role as role_repo,
    training as training_repo, user as user_repo,
};
use crate::store::{
    DatasetRepo, MetadataStore, MetadataTx, ParamRepo, RoleRepo, TrainingRepo, UserRepo,
};
use std::time::Duration;

/// Tables created at startup when missing.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    username        TEXT PRIMARY KEY,
    email           TEXT NOT NULL,
    password        TEXT NOT NULL,
    fullname        TEXT NOT NULL,
    shortname       TEXT NOT NULL,
    role_id         TEXT NOT NULL,
    institution_id  TEXT NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS role (
    id          TEXT PRIMARY KEY,
    role_name   TEXT NOT NULL,
    role_desc   TEXT,
    is_active   BOOLEAN NOT NULL DEFAULT TRUE,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by  TEXT NOT NULL,
    updated_by  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS menu (
    id          TEXT PRIMARY KEY,
    menu_name   TEXT NOT NULL,
    menu_route  TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by  TEXT NOT NULL,
    updated_by  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS menu_mapping (
    id              BIGSERIAL PRIMARY KEY,
    role_id         TEXT NOT NULL REFERENCES role (id) ON DELETE CASCADE,
    menu_id         TEXT NOT NULL REFERENCES menu (id) ON DELETE CASCADE,
    access_method   TEXT NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by      TEXT NOT NULL,
    updated_by      TEXT NOT NULL,
    UNIQUE (role_id, menu_id)
);

CREATE TABLE IF NOT EXISTS face_datasets (
    username    TEXT PRIMARY KEY,
    dataset     TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS model_training (
    id              UUID PRIMARY KEY,
    institution_id  TEXT NOT NULL,
    status          TEXT NOT NULL,
    is_used         BOOLEAN NOT NULL DEFAULT FALSE,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_model_training_institution_created
    ON model_training (institution_id, created_at DESC);

CREATE TABLE IF NOT EXISTS parameter (
    id          TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by  TEXT NOT NULL
);
"#;

/// Creates a new database connection pool.
///
/// # Arguments
///
/// * `database_url` - The URL of the PostgreSQL database.
///
/// # Returns
///
/// A `Result` containing the `Pool`.
pub fn create_pool(database_url: &str) -> Result<Pool> {
    let mut cfg = Config::new();
    let pg_config: tokio_postgres::Config = database_url.parse()?;

    if let Some(host) = pg_config.get_hosts().first() {
        if let tokio_postgres::config::Host::Tcp(hostname) = host {
            cfg.host = Some(hostname.clone());
        }
    }

    if let Some(port) = pg_config.get_ports().first() {
        cfg.port = Some(*port);
    }

    if let Some(dbname) = pg_config.get_dbname() {
        cfg.dbname = Some(dbname.to_string());
    }

    if let Some(user) = pg_config.get_user() {
        cfg.user = Some(user.to_string());
    }

    if let Some(password) = pg_config.get_password() {
        cfg.password = Some(String::from_utf8_lossy(password).to_string());
    }

    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.pool = Some(PoolConfig {
        max_size: 32,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(5)),
            create: Some(Duration::from_secs(2)),
            recycle: Some(Duration::from_secs(1)),
        },
        ..PoolConfig::default()
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| AppError::Internal(format!("Failed to create pool: {}", e)))
}

/// Creates any missing tables.
pub async fn ensure_schema(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;
    client.batch_execute(SCHEMA_SQL).await?;
    tracing::info!("✅ Database schema verified");
    Ok(())
}

/// PostgreSQL-backed metadata store.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

/// A transaction that owns its pooled connection.
///
/// Dropping it while still open detaches the connection from the pool, so
/// the server aborts the transaction when the connection closes.
pub struct PgTransaction {
    client: Option<Object>,
}

impl PgTransaction {
    async fn begin(client: Object) -> Result<Self> {
        client.batch_execute("BEGIN").await?;
        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&self) -> Result<&Object> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Internal("Transaction already finished".to_string()))
    }

    async fn finish(self: Box<Self>, statement: &str) -> Result<()> {
        let mut this = self;
        let client = this
            .client
            .take()
            .ok_or_else(|| AppError::Internal("Transaction already finished".to_string()))?;

        if let Err(e) = client.batch_execute(statement).await {
            let _ = Object::take(client);
            return Err(e.into());
        }
        Ok(())
    }
}

impl Drop for PgTransaction {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            tracing::warn!("⚠️ Transaction dropped while open, discarding connection");
            let _ = Object::take(client);
        }
    }
}

#[async_trait]
impl MetadataTx for PgTransaction {
    async fn datasets_for(&mut self, username: &str) -> Result<Vec<Dataset>> {
        dataset_repo::list_datasets(self.client()?, Some(username)).await
    }

    async fn insert_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        dataset_repo::insert_dataset(self.client()?, dataset).await
    }

    async fn delete_datasets(&mut self, username: &str) -> Result<u64> {
        dataset_repo::delete_datasets(self.client()?, username).await
    }

    async fn insert_training_job(&mut self, job: &TrainingJob) -> Result<()> {
        training_repo::insert_job(self.client()?, job).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.finish("ROLLBACK").await
    }
}

#[async_trait]
impl UserRepo for PgStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        let client = self.pool.get().await?;
        user_repo::create_user(&client, user).await
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        user_repo::find_by_username(&client, username).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let client = self.pool.get().await?;
        user_repo::list_users(&client).await
    }

    async fn list_institutions(&self) -> Result<Vec<String>> {
        let client = self.pool.get().await?;
        user_repo::list_institutions(&client).await
    }
}

#[async_trait]
impl RoleRepo for PgStore {
    async fn list_roles(&self) -> Result<Vec<Role>> {
        let client = self.pool.get().await?;
        role_repo::list_roles(&client).await
    }

    async fn create_role(&self, role: &Role) -> Result<()> {
        let client = self.pool.get().await?;
        role_repo::create_role(&client, role).await
    }

    async fn update_role(&self, role: &Role) -> Result<u64> {
        let client = self.pool.get().await?;
        role_repo::update_role(&client, role).await
    }

    async fn list_menus(&self) -> Result<Vec<Menu>> {
        let client = self.pool.get().await?;
        role_repo::list_menus(&client).await
    }

    async fn create_menu(&self, menu: &Menu) -> Result<()> {
        let client = self.pool.get().await?;
        role_repo::create_menu(&client, menu).await
    }

    async fn update_menu(&self, menu: &Menu) -> Result<u64> {
        let client = self.pool.get().await?;
        role_repo::update_menu(&client, menu).await
    }

    async fn delete_menu(&self, id: &str) -> Result<u64> {
        let client = self.pool.get().await?;
        role_repo::delete_menu(&client, id).await
    }

    async fn mappings_for_role(&self, role_id: &str) -> Result<Vec<MenuRoleMapping>> {
        let client = self.pool.get().await?;
        role_repo::mappings_for_role(&client, role_id).await
    }

    async fn list_mappings(&self) -> Result<Vec<MenuRoleMapping>> {
        let client = self.pool.get().await?;
        role_repo::list_mappings(&client).await
    }

    async fn create_mapping(&self, mapping: &MenuRoleMapping) -> Result<()> {
        let client = self.pool.get().await?;
        role_repo::create_mapping(&client, mapping).await
    }

    async fn update_mapping(&self, mapping: &MenuRoleMapping) -> Result<u64> {
        let client = self.pool.get().await?;
        role_repo::update_mapping(&client, mapping).await
    }
}

#[async_trait]
impl DatasetRepo for PgStore {
    async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        let client = self.pool.get().await?;
        dataset_repo::list_datasets(&client, None).await
    }
}

#[async_trait]
impl TrainingRepo for PgStore {
    async fn training_history(&self, query: &TrainingQuery) -> Result<Vec<TrainingJob>> {
        let client = self.pool.get().await?;
        training_repo::history(&client, query).await
    }

    async fn last_training_at(&self, institution_id: &str) -> Result<Option<DateTime<Utc>>> {
        let client = self.pool.get().await?;
        training_repo::last_created_at(&client, institution_id).await
    }
}

#[async_trait]
impl ParamRepo for PgStore {
    async fn get_param(&self, key: &str) -> Result<Option<Parameter>> {
        let client = self.pool.get().await?;
        param_repo::get_param(&client, key).await
    }

    async fn list_params(&self) -> Result<Vec<Parameter>> {
        let client = self.pool.get().await?;
        param_repo::list_params(&client).await
    }

    async fn insert_param(&self, param: &Parameter) -> Result<()> {
        let client = self.pool.get().await?;
        param_repo::insert_param(&client, param).await
    }

    async fn upsert_param(&self, param: &Parameter) -> Result<()> {
        let client = self.pool.get().await?;
        param_repo::upsert_param(&client, param).await
    }

    async fn delete_param(&self, key: &str) -> Result<u64> {
        let client = self.pool.get().await?;
        param_repo::delete_param(&client, key).await
    }
}

#[async_trait]
impl MetadataStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn MetadataTx>> {
        let client = self.pool.get().await?;
        let tx = PgTransaction::begin(client).await?;
        Ok(Box::new(tx))
    }
}
