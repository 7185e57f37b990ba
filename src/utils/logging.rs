use log::LevelFilter;

/// Initializes `env_logger` at `log_level` unless `RUST_LOG` overrides it.
pub fn init_logging(log_level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}
