use super::app_config::AppConfig;

/// Initialise `env_logger`. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &AppConfig) {
    let default_filter = config.log_level.as_deref().unwrap_or("info");
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .try_init();
}
