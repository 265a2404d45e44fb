//! Queries against the `users` table.
//!
//! All functions are generic over the executor so they work with a pool,
//! a single connection, or a transaction.

use sqlx::Executor;
use uuid::Uuid;

use crate::DbBackend;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub is_admin: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Fetch every user whose admin flag is unset, oldest first.
pub async fn list_non_admins<'e, E>(executor: E) -> Result<Vec<UserRow>, sqlx::Error>
where
    E: Executor<'e, Database = DbBackend>,
{
    sqlx::query_as::<_, UserRow>(
        "SELECT id, username, display_name, is_admin, created_at, updated_at \
         FROM users WHERE is_admin = 0 ORDER BY created_at",
    )
    .fetch_all(executor)
    .await
}

/// Set the admin flag on a user, refreshing `updated_at`.
///
/// Returns the number of rows affected; 0 means the user no longer exists.
pub async fn grant_admin<'e, E>(
    executor: E,
    user_id: &Uuid,
    updated_at: &str,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = DbBackend>,
{
    sqlx::query("UPDATE users SET is_admin = 1, updated_at = ? WHERE id = ?")
        .bind(updated_at)
        .bind(user_id)
        .execute(executor)
        .await
        .map(|r| r.rows_affected())
}

pub async fn insert_user<'e, E>(executor: E, row: &UserRow) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = DbBackend>,
{
    sqlx::query(
        "INSERT INTO users (id, username, display_name, is_admin, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(row.id)
    .bind(&row.username)
    .bind(&row.display_name)
    .bind(row.is_admin)
    .bind(&row.created_at)
    .bind(&row.updated_at)
    .execute(executor)
    .await
    .map(|_| ())
}
