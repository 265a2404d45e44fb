/// Initialize tracing from configuration.
///
/// Diagnostics go to stderr; stdout is reserved for the task's status lines.
pub fn install_tracing(cfg: &adminsync_config::LoggingConfig) {
    use tracing_subscriber::fmt::time::ChronoUtc;

    let env_filter_str = std::env::var("RUST_LOG").unwrap_or_else(|_| cfg.level.clone());
    let env_filter = tracing_subscriber::EnvFilter::new(&env_filter_str);

    if cfg.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
