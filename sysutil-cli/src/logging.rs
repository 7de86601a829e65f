use tracing_subscriber::EnvFilter;

/// Install the global subscriber, configured with `RUST_LOG`.
///
/// Logs go to stderr, stdout only ever carries the tool's output.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
