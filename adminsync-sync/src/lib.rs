//! The admin sync maintenance task.
//!
//! Grants the administrator flag to every non-admin user whose login appears
//! on a configured allow-list. Intended to run periodically (cron or a
//! scheduler) as a stand-in for group-based synchronization from an external
//! identity provider.
//!
//! # Pieces
//!
//! - [`AllowList`] - the set of privileged logins, matched case-insensitively
//! - [`UserDirectory`] - narrow view of the user store the task runs against
//! - [`SqlUserDirectory`] - the SQLx-backed directory implementation
//! - [`AdminSync`] - the task itself; one [`AdminSync::run`] is one pass
//! - [`SyncReport`] - what a pass granted, skipped, and failed to persist

mod allow_list;
mod directory;
mod report;
mod sql;
mod task;

pub use allow_list::{AllowList, DEFAULT_ADMIN_LOGINS};
pub use directory::{DirectoryError, UserDirectory, UserRecord};
pub use report::{GrantFailure, SyncReport};
pub use sql::SqlUserDirectory;
pub use task::{AdminSync, SyncError};

// Re-export async_trait for convenience when implementing UserDirectory
pub use async_trait::async_trait;
