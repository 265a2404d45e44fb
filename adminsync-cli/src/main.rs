//! adminsync
//!
//! Periodic maintenance task that grants administrator rights to users whose
//! login is on a configured allow-list. Entry point wiring: CLI args,
//! configuration loading, tracing, database pool, migrations, one sync pass.

use adminsync_sync::{AdminSync, AllowList, SqlUserDirectory};

mod cli;
mod config_helpers;
mod tracing_setup;

use cli::CliArgs;
use config_helpers::{database_config_from_config, run_migrations};
use tracing_setup::install_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.help_requested {
        CliArgs::print_help();
        return Ok(());
    }

    // Resolve config path: CLI > environment variable
    let config_path = args
        .config_path
        .or_else(|| std::env::var("ADMINSYNC_CONFIG_PATH").ok());

    let config = load_config(&config_path)?;
    adminsync_config::validate_config(&config)?;

    install_tracing(&config.logging);

    let db_cfg = database_config_from_config(&config)?;
    tracing::debug!(
        db_url = %adminsync_db::utils::sanitize_database_url(&db_cfg.url),
        admin_logins = ?config.sync.admin_logins,
        "configuration resolved"
    );

    let pool = adminsync_db::create_pool(&db_cfg).await?;
    run_migrations(&config.database.driver, &pool).await?;

    let task = AdminSync::new(AllowList::new(&config.sync.admin_logins));
    let directory = SqlUserDirectory::new(pool.clone());

    let mut out = std::io::stdout();
    let report = task.run(&directory, &mut out).await?;

    pool.close().await;

    if report.has_failures() {
        anyhow::bail!(
            "{} of {} matching users could not be updated",
            report.failed.len(),
            report.failed.len() + report.granted.len()
        );
    }

    Ok(())
}

/// Load configuration from file or defaults.
fn load_config(path: &Option<String>) -> anyhow::Result<adminsync_config::Config> {
    let loaded = match path.as_deref() {
        Some(p) => adminsync_config::load_config(Some(p)),
        None => adminsync_config::load_config::<&std::path::Path>(None),
    };
    loaded.map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))
}
