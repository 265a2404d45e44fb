#[cfg(feature = "mysql")]
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
#[cfg(feature = "postgres")]
use sqlx::postgres::{PgPool, PgPoolOptions};
#[cfg(feature = "sqlite")]
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::DbConnectionConfig;
use crate::error::DbConnectionError;
use crate::utils::sanitize_database_url;

#[cfg(feature = "postgres")]
pub type DbPool = PgPool;
#[cfg(feature = "mysql")]
pub type DbPool = MySqlPool;
#[cfg(feature = "sqlite")]
pub type DbPool = SqlitePool;

#[cfg(feature = "postgres")]
type DbPoolOptions = PgPoolOptions;
#[cfg(feature = "mysql")]
type DbPoolOptions = MySqlPoolOptions;
#[cfg(feature = "sqlite")]
type DbPoolOptions = SqlitePoolOptions;

/// Creates a new backend-specific connection pool using the provided configuration.
pub async fn create_pool(config: &DbConnectionConfig) -> Result<DbPool, DbConnectionError> {
    let url = config.url.trim();
    if url.is_empty() {
        return Err(DbConnectionError::EmptyDatabaseUrl);
    }

    // For sqlite, if the URL refers to a file-based database ensure the
    // parent directory and the file exist before attempting to open a pool.
    // This avoids sqlx returning "unable to open database file" when the
    // file or directory is missing.
    #[cfg(feature = "sqlite")]
    ensure_sqlite_db_file_exists(url)?;

    tracing::debug!(
        db_url = %sanitize_database_url(url),
        max_connections = config.max_connections,
        "opening database pool"
    );

    let mut opts = DbPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout());

    if let Some(idle) = config.idle_timeout() {
        opts = opts.idle_timeout(idle);
    }

    opts.connect(url).await.map_err(Into::into)
}

#[cfg(feature = "sqlite")]
fn ensure_sqlite_db_file_exists(database_url: &str) -> Result<(), DbConnectionError> {
    use std::fs::{create_dir_all, File};
    use std::path::Path;

    let Some(clean_path) = extract_sqlite_path(database_url) else {
        return Ok(());
    };

    let db_path = Path::new(clean_path);
    if let Some(parent) = db_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty() && !p.exists())
    {
        create_dir_all(parent).map_err(|e| {
            DbConnectionError::FileCreation(format!(
                "failed to create parent directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    if !db_path.exists() {
        File::create(db_path).map_err(|e| {
            DbConnectionError::FileCreation(format!(
                "failed to create DB file '{}': {e}",
                db_path.display()
            ))
        })?;
    }

    Ok(())
}

/// Extract the file path from a SQLite connection URL.
/// Returns None for in-memory databases or empty paths.
#[cfg(feature = "sqlite")]
fn extract_sqlite_path(url: &str) -> Option<&str> {
    let lower = url.to_ascii_lowercase();
    if lower.contains(":memory:") || lower.contains("mode=memory") {
        return None;
    }

    // Strip sqlite scheme variants
    let mut path = url;
    path = path
        .strip_prefix("sqlite://")
        .or_else(|| path.strip_prefix("sqlite:"))
        .unwrap_or(path);
    path = path.strip_prefix("file:").unwrap_or(path);

    // Remove query params if present
    if let Some(idx) = path.find('?') {
        path = &path[..idx];
    }

    let path = path.trim();
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_have_no_path() {
        assert_eq!(extract_sqlite_path("sqlite::memory:"), None);
        assert_eq!(extract_sqlite_path("sqlite://file::memory:?cache=shared"), None);
        assert_eq!(extract_sqlite_path("sqlite://users.sqlite?mode=memory"), None);
    }

    #[test]
    fn file_urls_are_stripped_to_paths() {
        assert_eq!(
            extract_sqlite_path("sqlite://data/users.sqlite"),
            Some("data/users.sqlite")
        );
        assert_eq!(
            extract_sqlite_path("sqlite:users.sqlite?cache=shared"),
            Some("users.sqlite")
        );
    }

    #[tokio::test]
    async fn create_pool_makes_missing_sqlite_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_file = dir.path().join("nested").join("users.sqlite");
        let url = format!("sqlite://{}", db_file.display());
        let pool = create_pool(&DbConnectionConfig::new(&url)).await.expect("pool");
        assert!(db_file.exists());
        pool.close().await;
    }
}
