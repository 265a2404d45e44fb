//! End-to-end sync pass against a real sqlite store.

use adminsync_db::users::{self, UserRow};
use adminsync_db::{create_pool, DbConnectionConfig, DbPool};
use adminsync_sync::{AdminSync, SqlUserDirectory};
use uuid::Uuid;

async fn seeded_pool(dir: &tempfile::TempDir) -> DbPool {
    let url = format!("sqlite://{}", dir.path().join("users.sqlite").display());
    let pool = create_pool(&DbConnectionConfig::new(&url))
        .await
        .expect("pool");
    adminsync_migrations::sqlite_migrator()
        .run(&pool)
        .await
        .expect("migrations");

    for (username, is_admin, created_at) in [
        ("alice", 0, "2024-01-01T00:00:00Z"),
        ("Admin", 0, "2024-01-02T00:00:00Z"),
        ("bob", 1, "2024-01-03T00:00:00Z"),
    ] {
        let row = UserRow {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: None,
            is_admin,
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
        };
        users::insert_user(&pool, &row).await.expect("insert");
    }
    pool
}

#[tokio::test]
async fn sync_pass_grants_matching_users_and_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = seeded_pool(&dir).await;
    let directory = SqlUserDirectory::new(pool.clone());
    let task = AdminSync::default();

    let mut out = Vec::new();
    let report = task.run(&directory, &mut out).await.expect("run");

    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "Checking for users in administrator groups...\n\
         Granted admin rights to: Admin\n\
         Admin sync complete.\n"
    );
    assert_eq!(report.scanned, 2);
    assert_eq!(report.granted, vec!["Admin"]);
    assert!(!report.has_failures());

    // alice is the only non-admin left; Admin and bob both carry the flag now.
    let remaining = users::list_non_admins(&pool).await.expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].username, "alice");

    // A second pass finds nothing to grant.
    let mut out = Vec::new();
    let report = task.run(&directory, &mut out).await.expect("rerun");
    assert!(report.granted.is_empty());
    assert_eq!(report.scanned, 1);
    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "Checking for users in administrator groups...\nAdmin sync complete.\n"
    );

    pool.close().await;
}
