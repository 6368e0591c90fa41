use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives
pub const LOG_ENV: &str = "INDEXED_LINES_LOG";

/// Install the global tracing subscriber. Logs go to stderr, stdout stays reserved for the
/// console protocol. Filter directives are read from `INDEXED_LINES_LOG`, `warn` if unset.
///
/// Calling this more than once is harmless, only the first subscriber gets installed.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
