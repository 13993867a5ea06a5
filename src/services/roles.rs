use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        role::{Menu, MenuRoleMapping, Role},
        session::Actor,
    },
    store::MetadataStore,
};

/// Management of roles, menus and the mappings between them.
///
/// Changes apply to tokens issued afterwards; existing tokens keep the
/// access snapshot taken at login.
#[derive(Clone)]
pub struct RoleService {
    store: Arc<dyn MetadataStore>,
}

fn expect_updated(rows: u64, what: &str, id: &str) -> Result<()> {
    if rows == 0 {
        return Err(AppError::NotFound(format!("{} {} not found", what, id)));
    }
    Ok(())
}

impl RoleService {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        self.store.list_roles().await
    }

    pub async fn create_role(
        &self,
        role_name: &str,
        role_desc: Option<String>,
        actor: &Actor,
    ) -> Result<Role> {
        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4().to_string(),
            role_name: role_name.to_string(),
            role_desc,
            is_active: true,
            created_at: now,
            updated_at: now,
            created_by: actor.username.clone(),
            updated_by: actor.username.clone(),
        };
        self.store.create_role(&role).await?;
        tracing::info!("✅ Role {} created by {}", role.id, actor.username);
        Ok(role)
    }

    pub async fn update_role(
        &self,
        id: &str,
        role_name: &str,
        role_desc: Option<String>,
        is_active: bool,
        actor: &Actor,
    ) -> Result<()> {
        let now = Utc::now();
        let role = Role {
            id: id.to_string(),
            role_name: role_name.to_string(),
            role_desc,
            is_active,
            created_at: now,
            updated_at: now,
            created_by: actor.username.clone(),
            updated_by: actor.username.clone(),
        };
        expect_updated(self.store.update_role(&role).await?, "Role", id)
    }

    pub async fn list_menus(&self) -> Result<Vec<Menu>> {
        self.store.list_menus().await
    }

    pub async fn create_menu(&self, menu_name: &str, menu_route: &str, actor: &Actor) -> Result<Menu> {
        let now = Utc::now();
        let menu = Menu {
            id: Uuid::new_v4().to_string(),
            menu_name: menu_name.to_string(),
            menu_route: menu_route.to_string(),
            created_at: now,
            updated_at: now,
            created_by: actor.username.clone(),
            updated_by: actor.username.clone(),
        };
        self.store.create_menu(&menu).await?;
        tracing::info!("✅ Menu {} created by {}", menu.id, actor.username);
        Ok(menu)
    }

    pub async fn update_menu(
        &self,
        id: &str,
        menu_name: &str,
        menu_route: &str,
        actor: &Actor,
    ) -> Result<()> {
        let now = Utc::now();
        let menu = Menu {
            id: id.to_string(),
            menu_name: menu_name.to_string(),
            menu_route: menu_route.to_string(),
            created_at: now,
            updated_at: now,
            created_by: actor.username.clone(),
            updated_by: actor.username.clone(),
        };
        expect_updated(self.store.update_menu(&menu).await?, "Menu", id)
    }

    pub async fn delete_menu(&self, id: &str) -> Result<()> {
        expect_updated(self.store.delete_menu(id).await?, "Menu", id)?;
        tracing::info!("🗑️ Menu {} deleted", id);
        Ok(())
    }

    pub async fn list_mappings(&self) -> Result<Vec<MenuRoleMapping>> {
        self.store.list_mappings().await
    }

    pub async fn create_mapping(
        &self,
        role_id: &str,
        menu_id: &str,
        access_method: &str,
        actor: &Actor,
    ) -> Result<()> {
        let now = Utc::now();
        let mapping = MenuRoleMapping {
            id: 0,
            role_id: role_id.to_string(),
            role_name: String::new(),
            menu_id: menu_id.to_string(),
            menu_name: String::new(),
            menu_route: String::new(),
            access_method: normalize_verbs(access_method)?,
            created_at: now,
            updated_at: now,
            created_by: actor.username.clone(),
            updated_by: actor.username.clone(),
        };
        self.store.create_mapping(&mapping).await?;
        tracing::info!("✅ Mapping {} -> {} created by {}", role_id, menu_id, actor.username);
        Ok(())
    }

    pub async fn update_mapping(&self, id: i64, access_method: &str, actor: &Actor) -> Result<()> {
        let now = Utc::now();
        let mapping = MenuRoleMapping {
            id,
            role_id: String::new(),
            role_name: String::new(),
            menu_id: String::new(),
            menu_name: String::new(),
            menu_route: String::new(),
            access_method: normalize_verbs(access_method)?,
            created_at: now,
            updated_at: now,
            created_by: actor.username.clone(),
            updated_by: actor.username.clone(),
        };
        expect_updated(self.store.update_mapping(&mapping).await?, "Mapping", &id.to_string())
    }
}

/// Canonical `"GET,POST"` form: upper-cased, trimmed, no empties.
fn normalize_verbs(access_method: &str) -> Result<String> {
    let verbs: Vec<String> = access_method
        .split(',')
        .map(|v| v.trim().to_ascii_uppercase())
        .filter(|v| !v.is_empty())
        .collect();

    if verbs.is_empty() {
        return Err(AppError::Validation("access_method must list at least one verb".to_string()));
    }

    Ok(verbs.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_are_normalized() {
        assert_eq!(normalize_verbs(" get, Post ,,DELETE").unwrap(), "GET,POST,DELETE");
    }

    #[test]
    fn empty_verb_list_is_invalid() {
        assert!(matches!(normalize_verbs(" , "), Err(AppError::Validation(_))));
    }
}
