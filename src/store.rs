//! Metadata store seams.
//!
//! Services only see these traits; `db::PgStore` is the production
//! implementation and `testing::MemoryStore` the in-memory one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    dataset::Dataset,
    param::Parameter,
    role::{Menu, MenuRoleMapping, Role},
    training::{TrainingJob, TrainingQuery},
    user::User,
};

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Inserts a user. A duplicate username is a `Conflict`.
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn find_user(&self, username: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn list_institutions(&self) -> Result<Vec<String>>;
}

#[async_trait]
pub trait RoleRepo: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<Role>>;
    async fn create_role(&self, role: &Role) -> Result<()>;
    /// Returns the number of rows updated.
    async fn update_role(&self, role: &Role) -> Result<u64>;

    async fn list_menus(&self) -> Result<Vec<Menu>>;
    async fn create_menu(&self, menu: &Menu) -> Result<()>;
    async fn update_menu(&self, menu: &Menu) -> Result<u64>;
    async fn delete_menu(&self, id: &str) -> Result<u64>;

    /// Mappings granted to one role, ordered by mapping id.
    async fn mappings_for_role(&self, role_id: &str) -> Result<Vec<MenuRoleMapping>>;
    async fn list_mappings(&self) -> Result<Vec<MenuRoleMapping>>;
    async fn create_mapping(&self, mapping: &MenuRoleMapping) -> Result<()>;
    async fn update_mapping(&self, mapping: &MenuRoleMapping) -> Result<u64>;
}

#[async_trait]
pub trait DatasetRepo: Send + Sync {
    async fn list_datasets(&self) -> Result<Vec<Dataset>>;
}

#[async_trait]
pub trait TrainingRepo: Send + Sync {
    async fn training_history(&self, query: &TrainingQuery) -> Result<Vec<TrainingJob>>;
    async fn last_training_at(&self, institution_id: &str) -> Result<Option<DateTime<Utc>>>;
}

#[async_trait]
pub trait ParamRepo: Send + Sync {
    async fn get_param(&self, key: &str) -> Result<Option<Parameter>>;
    async fn list_params(&self) -> Result<Vec<Parameter>>;
    /// Inserts a new parameter. A duplicate key is a `Conflict`.
    async fn insert_param(&self, param: &Parameter) -> Result<()>;
    /// Inserts or overwrites a parameter.
    async fn upsert_param(&self, param: &Parameter) -> Result<()>;
    async fn delete_param(&self, key: &str) -> Result<u64>;
}

/// An open metadata transaction.
///
/// Nothing written through it is visible to other readers until `commit`.
/// Callers must finish every transaction with `commit` or `rollback`.
#[async_trait]
pub trait MetadataTx: Send {
    async fn datasets_for(&mut self, username: &str) -> Result<Vec<Dataset>>;
    async fn insert_dataset(&mut self, dataset: &Dataset) -> Result<()>;
    /// Returns the number of rows deleted.
    async fn delete_datasets(&mut self, username: &str) -> Result<u64>;
    async fn insert_training_job(&mut self, job: &TrainingJob) -> Result<()>;
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// The relational metadata store.
#[async_trait]
pub trait MetadataStore: UserRepo + RoleRepo + DatasetRepo + TrainingRepo + ParamRepo {
    async fn begin(&self) -> Result<Box<dyn MetadataTx>>;
}

/// Rolls `tx` back after `op` failed. A failing rollback is logged; the
/// caller still reports the original error.
pub async fn rollback_after_failure(tx: Box<dyn MetadataTx>, op: &str) {
    match tx.rollback().await {
        Ok(()) => tracing::debug!("↩️ {}: metadata transaction rolled back", op),
        Err(e) => tracing::error!("❌ {}: rollback failed: {}", op, e),
    }
}
