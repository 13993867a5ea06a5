use tokio_postgres::{Client, Row};
use crate::{
    error::Result,
    models::user::User,
};

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password")?,
        fullname: row.try_get("fullname")?,
        shortname: row.try_get("shortname")?,
        role_id: row.try_get("role_id")?,
        institution_id: row.try_get("institution_id")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Creates a new user in the database.
pub async fn create_user(client: &Client, user: &User) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO users (username, email, password, fullname, shortname, role_id, institution_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            &[
                &user.username,
                &user.email,
                &user.password_hash,
                &user.fullname,
                &user.shortname,
                &user.role_id,
                &user.institution_id,
                &user.created_at,
            ],
        )
        .await?;
    Ok(())
}

/// Finds a user by their username.
pub async fn find_by_username(client: &Client, username: &str) -> Result<Option<User>> {
    let row = client
        .query_opt(
            r#"
            SELECT username, email, password, fullname, shortname, role_id, institution_id, created_at
            FROM users
            WHERE username = $1
            "#,
            &[&username],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Lists every user.
pub async fn list_users(client: &Client) -> Result<Vec<User>> {
    let rows = client
        .query(
            r#"
            SELECT username, email, password, fullname, shortname, role_id, institution_id, created_at
            FROM users
            ORDER BY username ASC
            "#,
            &[],
        )
        .await?;
    rows.iter().map(row_to_user).collect()
}

/// Lists the distinct institutions users belong to.
pub async fn list_institutions(client: &Client) -> Result<Vec<String>> {
    let rows = client
        .query(
            "SELECT DISTINCT institution_id FROM users ORDER BY institution_id ASC",
            &[],
        )
        .await?;
    rows.iter()
        .map(|r| Ok(r.try_get::<_, String>("institution_id")?))
        .collect()
}
