use tracing_subscriber::EnvFilter;

/// Install the process-wide `tracing` subscriber.
///
/// Filter comes from `RUST_LOG` (default `info`). Safe to call more than
/// once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
