use uuid::Uuid;

use crate::directory::DirectoryError;

/// Outcome of one sync pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Number of non-admin users fetched from the store.
    pub scanned: usize,
    /// Logins granted the admin flag, in processing order.
    pub granted: Vec<String>,
    /// Matching users whose update was rejected by the store.
    pub failed: Vec<GrantFailure>,
}

#[derive(Debug)]
pub struct GrantFailure {
    pub id: Uuid,
    pub username: String,
    pub error: DirectoryError,
}

impl SyncReport {
    pub(crate) fn new(scanned: usize) -> Self {
        Self {
            scanned,
            ..Default::default()
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
