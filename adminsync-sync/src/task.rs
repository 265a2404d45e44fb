use std::io::Write;

use tracing::{debug, error, info};

use crate::allow_list::AllowList;
use crate::directory::{DirectoryError, UserDirectory};
use crate::report::{GrantFailure, SyncReport};

/// Errors that abort a sync pass outright.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Listing candidates failed; no user was processed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("failed to write sync output: {0}")]
    Io(#[from] std::io::Error),
}

/// The admin sync maintenance task.
///
/// One [`run`](Self::run) fetches every non-admin user from the directory,
/// grants the admin flag to those whose login is on the allow-list, and
/// writes one status line per grant between a fixed header and footer:
///
/// ```text
/// Checking for users in administrator groups...
/// Granted admin rights to: Admin
/// Admin sync complete.
/// ```
///
/// A grant rejected by the store is logged and recorded in the returned
/// [`SyncReport`]; the pass continues with the remaining users.
#[derive(Debug, Clone, Default)]
pub struct AdminSync {
    allow_list: AllowList,
}

impl AdminSync {
    pub fn new(allow_list: AllowList) -> Self {
        Self { allow_list }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Run one sync pass against `directory`, writing status lines to `out`.
    pub async fn run<D, W>(&self, directory: &D, out: &mut W) -> Result<SyncReport, SyncError>
    where
        D: UserDirectory + ?Sized,
        W: Write,
    {
        writeln!(out, "Checking for users in administrator groups...")?;
        debug!(allow_list_len = self.allow_list.len(), "starting admin sync pass");

        let candidates = directory.list_non_admins().await?;
        let mut report = SyncReport::new(candidates.len());

        for user in candidates {
            if !self.allow_list.contains(&user.username) {
                continue;
            }
            match directory.grant_admin(&user).await {
                Ok(()) => {
                    writeln!(out, "Granted admin rights to: {}", user.username)?;
                    info!(username = %user.username, user_id = %user.id, "granted admin rights");
                    report.granted.push(user.username);
                }
                Err(err) => {
                    // A rejected update must not stop the rest of the batch.
                    error!(
                        username = %user.username,
                        user_id = %user.id,
                        error = %err,
                        "failed to grant admin rights"
                    );
                    report.failed.push(GrantFailure {
                        id: user.id,
                        username: user.username,
                        error: err,
                    });
                }
            }
        }

        writeln!(out, "Admin sync complete.")?;
        info!(
            scanned = report.scanned,
            granted = report.granted.len(),
            failed = report.failed.len(),
            "admin sync pass finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryError, UserDirectory, UserRecord};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct MemoryDirectory {
        users: Mutex<Vec<(UserRecord, bool)>>,
        fail_for: HashSet<String>,
    }

    impl MemoryDirectory {
        fn new(users: &[(&str, bool)]) -> Self {
            Self {
                users: Mutex::new(
                    users
                        .iter()
                        .map(|(name, is_admin)| {
                            (
                                UserRecord {
                                    id: Uuid::new_v4(),
                                    username: name.to_string(),
                                },
                                *is_admin,
                            )
                        })
                        .collect(),
                ),
                fail_for: HashSet::new(),
            }
        }

        fn failing_on(mut self, username: &str) -> Self {
            self.fail_for.insert(username.to_string());
            self
        }

        fn is_admin(&self, username: &str) -> bool {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|(u, _)| u.username == username)
                .map(|(_, is_admin)| *is_admin)
                .expect("unknown user")
        }
    }

    #[async_trait]
    impl UserDirectory for MemoryDirectory {
        async fn list_non_admins(&self) -> Result<Vec<UserRecord>, DirectoryError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, is_admin)| !is_admin)
                .map(|(u, _)| u.clone())
                .collect())
        }

        async fn grant_admin(&self, user: &UserRecord) -> Result<(), DirectoryError> {
            if self.fail_for.contains(&user.username) {
                return Err(DirectoryError::Grant {
                    username: user.username.clone(),
                    source: "update rejected".into(),
                });
            }
            let mut users = self.users.lock().unwrap();
            let entry = users
                .iter_mut()
                .find(|(u, _)| u.id == user.id)
                .ok_or_else(|| DirectoryError::Missing {
                    id: user.id,
                    username: user.username.clone(),
                })?;
            entry.1 = true;
            Ok(())
        }
    }

    async fn run_to_string(
        task: &AdminSync,
        directory: &MemoryDirectory,
    ) -> (SyncReport, String) {
        let mut out = Vec::new();
        let report = task.run(directory, &mut out).await.expect("run");
        (report, String::from_utf8(out).expect("utf8"))
    }

    #[tokio::test]
    async fn grants_only_matching_users() {
        let directory =
            MemoryDirectory::new(&[("alice", false), ("Admin", false), ("bob", true)]);
        let task = AdminSync::default();

        let (report, output) = run_to_string(&task, &directory).await;

        assert_eq!(
            output,
            "Checking for users in administrator groups...\n\
             Granted admin rights to: Admin\n\
             Admin sync complete.\n"
        );
        assert_eq!(report.scanned, 2);
        assert_eq!(report.granted, vec!["Admin"]);
        assert!(!report.has_failures());
        assert!(!directory.is_admin("alice"));
        assert!(directory.is_admin("Admin"));
        assert!(directory.is_admin("bob"));
    }

    #[tokio::test]
    async fn matching_is_case_insensitive() {
        let directory = MemoryDirectory::new(&[("ADMIN", false)]);
        let task = AdminSync::default();

        let (report, _) = run_to_string(&task, &directory).await;

        assert_eq!(report.granted, vec!["ADMIN"]);
        assert!(directory.is_admin("ADMIN"));
    }

    #[tokio::test]
    async fn second_run_grants_nothing() {
        let directory = MemoryDirectory::new(&[("administrator", false), ("carol", false)]);
        let task = AdminSync::default();

        let (first, _) = run_to_string(&task, &directory).await;
        assert_eq!(first.granted, vec!["administrator"]);

        let (second, output) = run_to_string(&task, &directory).await;
        assert!(second.granted.is_empty());
        assert_eq!(second.scanned, 1);
        assert_eq!(
            output,
            "Checking for users in administrator groups...\nAdmin sync complete.\n"
        );
    }

    #[tokio::test]
    async fn grant_failure_does_not_stop_the_batch() {
        let directory =
            MemoryDirectory::new(&[("admin", false), ("administrator", false)])
                .failing_on("admin");
        let task = AdminSync::default();

        let (report, output) = run_to_string(&task, &directory).await;

        assert_eq!(report.granted, vec!["administrator"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].username, "admin");
        assert!(report.has_failures());
        assert!(!output.contains("Granted admin rights to: admin\n"));
        assert!(output.contains("Granted admin rights to: administrator\n"));
        assert!(directory.is_admin("administrator"));
        assert!(!directory.is_admin("admin"));
    }

    #[tokio::test]
    async fn injected_allow_list_replaces_defaults() {
        let directory = MemoryDirectory::new(&[("admin", false), ("ops-root", false)]);
        let task = AdminSync::new(AllowList::new(["ops-root"]));

        let (report, _) = run_to_string(&task, &directory).await;

        assert_eq!(report.granted, vec!["ops-root"]);
        assert!(!directory.is_admin("admin"));
    }

    #[tokio::test]
    async fn no_matches_emits_only_header_and_footer() {
        let directory = MemoryDirectory::new(&[("alice", false), ("dave", false)]);
        let task = AdminSync::default();

        let (report, output) = run_to_string(&task, &directory).await;

        assert!(report.granted.is_empty());
        assert_eq!(report.scanned, 2);
        assert_eq!(
            output,
            "Checking for users in administrator groups...\nAdmin sync complete.\n"
        );
    }
}
