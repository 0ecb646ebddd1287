use env_logger::{Builder, Env};

/// Initializes the global logger.
///
/// `RUST_LOG` wins when set; otherwise `level` (e.g. "info", "debug") is used.
/// Safe to call more than once.
pub fn init(level: &str) {
    let env = Env::default().default_filter_or(level);
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();

    // Only fails if a logger is already installed, which tests do repeatedly.
    let _ = builder.try_init();
}
