use adminsync_db::{DbConnectionConfig, DbConnectionError, DbPool};

/// Build database connection config from application config.
///
/// A full `ADMINSYNC_DATABASE_URL` environment configuration wins; otherwise
/// the URL is rendered from the `[database]` section.
pub fn database_config_from_config(
    cfg: &adminsync_config::Config,
) -> anyhow::Result<DbConnectionConfig> {
    match DbConnectionConfig::from_env("ADMINSYNC") {
        Ok(config) => Ok(config),
        Err(DbConnectionError::MissingEnvVar(_)) => {
            let url = adminsync_config::database_url(&cfg.database)?;
            Ok(DbConnectionConfig::new(url))
        }
        Err(error) => Err(error.into()),
    }
}

/// Run database migrations based on the configured driver.
pub async fn run_migrations(driver: &str, pool: &DbPool) -> anyhow::Result<()> {
    let migrate_res = match driver {
        "postgres" => {
            tracing::info!("applying Postgres migrations");
            adminsync_migrations::postgres_migrator().run(pool).await
        }
        "mysql" => {
            tracing::info!("applying MySQL migrations");
            adminsync_migrations::mysql_migrator().run(pool).await
        }
        _ => {
            tracing::info!("applying SQLite migrations");
            adminsync_migrations::sqlite_migrator().run(pool).await
        }
    };

    match migrate_res {
        Ok(_) => {
            tracing::info!("database migrations applied successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to apply database migrations");
            Err(anyhow::anyhow!("failed to apply database migrations: {e}"))
        }
    }
}
