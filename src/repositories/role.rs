use tokio_postgres::{Client, Row};
use crate::{
    error::Result,
    models::role::{Menu, MenuRoleMapping, Role},
};

fn row_to_role(row: &Row) -> Result<Role> {
    Ok(Role {
        id: row.try_get("id")?,
        role_name: row.try_get("role_name")?,
        role_desc: row.try_get("role_desc")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        created_by: row.try_get("created_by")?,
        updated_by: row.try_get("updated_by")?,
    })
}

fn row_to_menu(row: &Row) -> Result<Menu> {
    Ok(Menu {
        id: row.try_get("id")?,
        menu_name: row.try_get("menu_name")?,
        menu_route: row.try_get("menu_route")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        created_by: row.try_get("created_by")?,
        updated_by: row.try_get("updated_by")?,
    })
}

fn row_to_mapping(row: &Row) -> Result<MenuRoleMapping> {
    Ok(MenuRoleMapping {
        id: row.try_get("id")?,
        role_id: row.try_get("role_id")?,
        role_name: row.try_get("role_name")?,
        menu_id: row.try_get("menu_id")?,
        menu_name: row.try_get("menu_name")?,
        menu_route: row.try_get("menu_route")?,
        access_method: row.try_get("access_method")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        created_by: row.try_get("created_by")?,
        updated_by: row.try_get("updated_by")?,
    })
}

const MAPPING_SELECT: &str = r#"
    SELECT map.id, map.role_id, role.role_name, map.menu_id, menu.menu_name, menu.menu_route,
           map.access_method, map.created_at, map.updated_at, map.created_by, map.updated_by
    FROM menu_mapping AS map
    JOIN menu ON map.menu_id = menu.id
    JOIN role ON map.role_id = role.id
"#;

pub async fn list_roles(client: &Client) -> Result<Vec<Role>> {
    let rows = client.query("SELECT * FROM role ORDER BY id ASC", &[]).await?;
    rows.iter().map(row_to_role).collect()
}

pub async fn create_role(client: &Client, role: &Role) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO role (id, role_name, role_desc, is_active, created_at, updated_at, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            &[
                &role.id,
                &role.role_name,
                &role.role_desc,
                &role.is_active,
                &role.created_at,
                &role.updated_at,
                &role.created_by,
                &role.updated_by,
            ],
        )
        .await?;
    Ok(())
}

pub async fn update_role(client: &Client, role: &Role) -> Result<u64> {
    let updated = client
        .execute(
            r#"
            UPDATE role
            SET role_name = $1, role_desc = $2, is_active = $3, updated_at = $4, updated_by = $5
            WHERE id = $6
            "#,
            &[
                &role.role_name,
                &role.role_desc,
                &role.is_active,
                &role.updated_at,
                &role.updated_by,
                &role.id,
            ],
        )
        .await?;
    Ok(updated)
}

pub async fn list_menus(client: &Client) -> Result<Vec<Menu>> {
    let rows = client.query("SELECT * FROM menu ORDER BY id ASC", &[]).await?;
    rows.iter().map(row_to_menu).collect()
}

pub async fn create_menu(client: &Client, menu: &Menu) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO menu (id, menu_name, menu_route, created_at, updated_at, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
            &[
                &menu.id,
                &menu.menu_name,
                &menu.menu_route,
                &menu.created_at,
                &menu.updated_at,
                &menu.created_by,
                &menu.updated_by,
            ],
        )
        .await?;
    Ok(())
}

pub async fn update_menu(client: &Client, menu: &Menu) -> Result<u64> {
    let updated = client
        .execute(
            r#"
            UPDATE menu
            SET menu_name = $1, menu_route = $2, updated_at = $3, updated_by = $4
            WHERE id = $5
            "#,
            &[
                &menu.menu_name,
                &menu.menu_route,
                &menu.updated_at,
                &menu.updated_by,
                &menu.id,
            ],
        )
        .await?;
    Ok(updated)
}

pub async fn delete_menu(client: &Client, id: &str) -> Result<u64> {
    let deleted = client
        .execute("DELETE FROM menu WHERE id = $1", &[&id])
        .await?;
    Ok(deleted)
}

pub async fn mappings_for_role(client: &Client, role_id: &str) -> Result<Vec<MenuRoleMapping>> {
    let query = format!("{} WHERE map.role_id = $1 ORDER BY map.id ASC", MAPPING_SELECT);
    let rows = client.query(query.as_str(), &[&role_id]).await?;
    rows.iter().map(row_to_mapping).collect()
}

pub async fn list_mappings(client: &Client) -> Result<Vec<MenuRoleMapping>> {
    let query = format!("{} ORDER BY map.id ASC", MAPPING_SELECT);
    let rows = client.query(query.as_str(), &[]).await?;
    rows.iter().map(row_to_mapping).collect()
}

pub async fn create_mapping(client: &Client, mapping: &MenuRoleMapping) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO menu_mapping (role_id, menu_id, access_method, created_at, updated_at, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
            &[
                &mapping.role_id,
                &mapping.menu_id,
                &mapping.access_method,
                &mapping.created_at,
                &mapping.updated_at,
                &mapping.created_by,
                &mapping.updated_by,
            ],
        )
        .await?;
    Ok(())
}

pub async fn update_mapping(client: &Client, mapping: &MenuRoleMapping) -> Result<u64> {
    let updated = client
        .execute(
            r#"
            UPDATE menu_mapping
            SET access_method = $1, updated_at = $2, updated_by = $3
            WHERE id = $4
            "#,
            &[
                &mapping.access_method,
                &mapping.updated_at,
                &mapping.updated_by,
                &mapping.id,
            ],
        )
        .await?;
    Ok(updated)
}
