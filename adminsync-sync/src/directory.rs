//! The repository seam between the sync task and the user store.

use async_trait::async_trait;
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A user as seen by the sync task.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
}

/// Errors surfaced by a [`UserDirectory`] implementation.
///
/// Sources are boxed so the trait stays agnostic to the storage technology.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to list non-admin users: {0}")]
    List(#[source] BoxError),

    #[error("failed to grant admin to {username}: {source}")]
    Grant {
        username: String,
        #[source]
        source: BoxError,
    },

    #[error("user {username} ({id}) no longer exists")]
    Missing { id: Uuid, username: String },
}

/// Narrow view of the user store needed by the sync task.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch every user whose admin flag is currently unset.
    async fn list_non_admins(&self) -> Result<Vec<UserRecord>, DirectoryError>;

    /// Set the admin flag on the given user and persist the change.
    async fn grant_admin(&self, user: &UserRecord) -> Result<(), DirectoryError>;
}
