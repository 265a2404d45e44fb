use adminsync_db::{users, DbPool};
use async_trait::async_trait;

use crate::directory::{DirectoryError, UserDirectory, UserRecord};

/// SQLx-backed implementation of [`UserDirectory`].
#[derive(Debug, Clone)]
pub struct SqlUserDirectory {
    pool: DbPool,
}

impl SqlUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for SqlUserDirectory {
    async fn list_non_admins(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let rows = users::list_non_admins(&self.pool)
            .await
            .map_err(|e| DirectoryError::List(e.into()))?;
        Ok(rows
            .into_iter()
            .map(|row| UserRecord {
                id: row.id,
                username: row.username,
            })
            .collect())
    }

    async fn grant_admin(&self, user: &UserRecord) -> Result<(), DirectoryError> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        let affected = users::grant_admin(&self.pool, &user.id, &updated_at)
            .await
            .map_err(|e| DirectoryError::Grant {
                username: user.username.clone(),
                source: e.into(),
            })?;
        if affected == 0 {
            return Err(DirectoryError::Missing {
                id: user.id,
                username: user.username.clone(),
            });
        }
        Ok(())
    }
}
